//! Fetch one community as seen by a viewer

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::communities::types::{Community, CommunityView, COMMUNITY_COLUMNS};
use crate::features::proposals::queries::{ListProposalsError, ListProposalsQuery};
use crate::features::proposals::types::ProposalStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCommunityQuery {
    pub id: Uuid,
    /// The requesting user, if authenticated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<Uuid>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetCommunityError {
    #[error("Community '{0}' not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ListProposalsError> for GetCommunityError {
    fn from(err: ListProposalsError) -> Self {
        match err {
            ListProposalsError::Database(e) => GetCommunityError::Database(e),
        }
    }
}

impl Request<Result<CommunityView, GetCommunityError>> for GetCommunityQuery {}

impl crate::cqrs::middleware::Query for GetCommunityQuery {}

pub async fn find_community(pool: &PgPool, id: Uuid) -> Result<Option<Community>, sqlx::Error> {
    sqlx::query_as::<_, Community>(&format!(
        "SELECT {} FROM communities c WHERE c.id = $1",
        COMMUNITY_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: GetCommunityQuery,
) -> Result<CommunityView, GetCommunityError> {
    let community = find_community(&pool, query.id)
        .await?
        .ok_or(GetCommunityError::NotFound(query.id))?;

    if query.viewer != Some(community.responsible_user_id) {
        return Ok(CommunityView {
            community,
            pending_proposals: None,
            accepted_proposals: None,
        });
    }

    let by_status = |status| ListProposalsQuery {
        community_id: community.id,
        status: Some(status),
    };
    let pending =
        crate::features::proposals::queries::list::handle(pool.clone(), by_status(ProposalStatus::Pending))
            .await?;
    let accepted =
        crate::features::proposals::queries::list::handle(pool, by_status(ProposalStatus::Accepted))
            .await?;

    Ok(CommunityView {
        community,
        pending_proposals: Some(pending),
        accepted_proposals: Some(accepted),
    })
}
