pub mod get;
pub mod latest;
pub mod stats;

pub use get::{load_detail, GetDatasetError, GetDatasetQuery};
pub use latest::{latest_synchronized, LatestDatasetsError, LatestDatasetsQuery};
pub use stats::{PlatformStats, PlatformStatsError, PlatformStatsQuery};
