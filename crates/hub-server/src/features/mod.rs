//! Feature modules implementing the hub API
//!
//! Each feature is a vertical slice with its own commands, queries, routes
//! and types, following the CQRS (Command Query Responsibility Segregation)
//! pattern.
//!
//! # Features
//!
//! - **communities**: Community management and icons
//! - **datasets**: Dataset registration, detail, view/download recording, statistics
//! - **explore**: Multi-criteria dataset filtering
//! - **proposals**: The community proposal workflow (propose, accept, reject)
//! - **related**: Related-dataset suggestions
//! - **trending**: Datasets ranked by recent views or downloads
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Write operations
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions
//! - `types.rs` - Shared types (if needed)

pub mod communities;
pub mod datasets;
pub mod explore;
pub mod proposals;
pub mod related;
pub mod shared;
pub mod trending;

use axum::Router;
use hub_common::kinds::KindRegistry;
use std::sync::Arc;

use crate::notify::Notifier;
use crate::storage::Storage;

/// Shared state for the feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool
    pub db: sqlx::PgPool,
    /// S3-compatible storage for community icons
    pub storage: Storage,
    /// Outbound email for proposal decisions
    pub notifier: Arc<dyn Notifier>,
    /// Registered dataset types
    pub kinds: Arc<KindRegistry>,
}

/// Creates the API router with all feature routes mounted
///
/// - `/explore` - Dataset filtering
/// - `/trending` - Trending datasets
/// - `/datasets` - Dataset registration, detail and activity
/// - `/communities` - Communities and their proposals
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/explore", explore::explore_routes().with_state(state.db.clone()))
        .nest("/trending", trending::trending_routes().with_state(state.db.clone()))
        .nest("/datasets", datasets::datasets_routes().with_state(state.clone()))
        .nest(
            "/communities",
            communities::communities_routes()
                .merge(proposals::proposals_routes())
                .with_state(state),
        )
}
