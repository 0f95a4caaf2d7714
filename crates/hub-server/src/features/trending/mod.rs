//! Trending datasets ranked by recent views or downloads

pub mod queries;
pub mod routes;
pub mod types;

pub use queries::{trending_datasets, TrendingQuery};
pub use routes::trending_routes;
pub use types::{TrendingEntry, TrendingItem, TrendingMetric, TrendingPeriod, TrendingResponse};
