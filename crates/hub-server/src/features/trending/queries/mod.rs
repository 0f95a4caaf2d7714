pub mod rank;

pub use rank::{rank_by_activity, rank_or_fallback, trending_datasets, TrendingQuery};
