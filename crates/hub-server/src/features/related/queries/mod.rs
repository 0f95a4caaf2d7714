pub mod suggest;

pub use suggest::{get_related_datasets, RelatedSignals, DEFAULT_RELATED_LIMIT};
