//! Error types shared across the hub crates

use thiserror::Error;

/// Result type alias for hub operations
pub type Result<T> = std::result::Result<T, HubError>;

/// Errors raised outside the HTTP layer
#[derive(Error, Debug)]
pub enum HubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Unknown dataset type: {0}")]
    UnknownDatasetType(String),
}
