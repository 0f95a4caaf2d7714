//! Related-dataset suggestions, served from `GET /api/v1/datasets/:id/related`

pub mod queries;

pub use queries::{get_related_datasets, RelatedSignals, DEFAULT_RELATED_LIMIT};
