//! Datasets: registration, detail, view/download recording and statistics

pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

pub use commands::{CreateDatasetCommand, CreateDatasetError, RecordActivityCommand, RecordKind};
pub use queries::{GetDatasetQuery, LatestDatasetsQuery, PlatformStats, PlatformStatsQuery};
pub use routes::datasets_routes;
pub use types::{CommunityRef, DataCategory, DatasetDetail, DatasetSummary};
