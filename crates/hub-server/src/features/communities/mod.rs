//! Communities: curated groups of datasets with a responsible user
//!
//! Membership is managed through the proposal workflow in
//! [`crate::features::proposals`]; this module owns the communities
//! themselves and their icons.

pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

pub use commands::{CreateCommunityCommand, SetIconCommand};
pub use queries::{GetCommunityQuery, ListCommunitiesQuery};
pub use routes::communities_routes;
pub use types::{Community, CommunityView, IconFormat};
