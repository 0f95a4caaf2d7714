pub mod create;
pub mod record;

pub use create::{AuthorInput, CreateDatasetCommand, CreateDatasetError, FileInput};
pub use record::{
    RecordActivityCommand, RecordActivityError, RecordActivityResponse, RecordKind,
};
