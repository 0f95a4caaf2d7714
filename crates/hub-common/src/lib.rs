//! Dataset Hub common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared building blocks for the hub workspace members:
//!
//! - **Error handling**: [`HubError`] and the [`Result`] alias
//! - **Logging**: tracing subscriber setup driven by `LOG_*` variables
//! - **Text**: search-term and tag normalization
//! - **Kinds**: the dataset type registry and its validators

pub mod error;
pub mod kinds;
pub mod logging;
pub mod text;

pub use error::{HubError, Result};
