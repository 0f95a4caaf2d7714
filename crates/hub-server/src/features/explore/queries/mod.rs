pub mod filter;

pub use filter::{build_filter_query, filter_datasets, ExploreError};
