//! Dataset discovery: the explore filter engine

pub mod queries;
pub mod routes;
pub mod types;

pub use queries::{filter_datasets, ExploreError};
pub use routes::explore_routes;
pub use types::{ExploreFilter, ExploreQuery, ListParam, Sorting};
