//! Dataset Hub Server Library
//!
//! HTTP server for sharing tabular datasets and curating them into
//! communities.
//!
//! # Overview
//!
//! - **Communities**: datasets are proposed to communities whose responsible
//!   user accepts or rejects them; a dataset belongs to at most one community
//! - **Discovery**: the explore filter engine, trending rankings and
//!   related-dataset suggestions
//! - **Datasets**: registration, detail, view and download recording
//! - **Notifications**: best-effort decision emails via SendGrid
//!
//! # Architecture
//!
//! The server follows a **CQRS** layout: every feature slice under
//! [`features`] separates commands (writes) from queries (reads), each with
//! its own error enum mapped to HTTP responses in the slice's routes.
//!
//! ## Framework Stack
//!
//! - **Axum**: web framework
//! - **SQLx**: PostgreSQL access with runtime-checked queries
//! - **Tower**: middleware (CORS, tracing, compression)
//!
//! # Example
//!
//! ```no_run
//! use hub_server::{api, config::Config};
//!
//! # async fn run(state: hub_server::features::FeatureState) -> anyhow::Result<()> {
//! let config = Config::load()?;
//! api::serve(config, state).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod cqrs;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod notify;
pub mod storage;

// Re-export commonly used types
pub use error::{AppError, AppResult};
