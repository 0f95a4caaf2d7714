//! Lookups the proposal routes need for authorization and notification

use sqlx::PgPool;
use uuid::Uuid;

use crate::features::proposals::types::{Proposal, PROPOSAL_COLUMNS};

/// Owner of a dataset, if the dataset exists
pub async fn dataset_owner(pool: &PgPool, dataset_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT user_id FROM datasets WHERE id = $1")
        .bind(dataset_id)
        .fetch_optional(pool)
        .await
}

/// Responsible user and name of a community, if the community exists
pub async fn community_responsible(
    pool: &PgPool,
    community_id: Uuid,
) -> Result<Option<(Uuid, String)>, sqlx::Error> {
    sqlx::query_as("SELECT responsible_user_id, name::text FROM communities WHERE id = $1")
        .bind(community_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_proposal(pool: &PgPool, proposal_id: Uuid) -> Result<Option<Proposal>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM community_dataset_proposals WHERE id = $1",
        PROPOSAL_COLUMNS
    );
    sqlx::query_as::<_, Proposal>(&sql)
        .bind(proposal_id)
        .fetch_optional(pool)
        .await
}

/// Who to tell about a decision, and about what
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DecisionRecipient {
    pub email: String,
    pub dataset_title: String,
}

pub async fn decision_recipient(
    pool: &PgPool,
    proposal: &Proposal,
) -> Result<Option<DecisionRecipient>, sqlx::Error> {
    sqlx::query_as::<_, DecisionRecipient>(
        r#"
        SELECT u.email::text AS email, COALESCE(m.title, '')::text AS dataset_title
        FROM users u
        LEFT JOIN dataset_metadata m ON m.dataset_id = $2
        WHERE u.id = $1
        "#,
    )
    .bind(proposal.proposed_by_user_id)
    .bind(proposal.dataset_id)
    .fetch_optional(pool)
    .await
}
