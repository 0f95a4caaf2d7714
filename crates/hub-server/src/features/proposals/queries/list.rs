//! List the proposals of a community

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::features::proposals::types::ProposalStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListProposalsQuery {
    pub community_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProposalStatus>,
}

/// A proposal with the dataset title and proposer email for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProposalListItem {
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub dataset_title: Option<String>,
    pub proposed_by_user_id: Uuid,
    pub proposer_email: String,
    #[sqlx(try_from = "String")]
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListProposalsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<ProposalListItem>, ListProposalsError>> for ListProposalsQuery {}

impl crate::cqrs::middleware::Query for ListProposalsQuery {}

#[tracing::instrument(skip(pool), fields(community_id = %query.community_id, status = ?query.status))]
pub async fn handle(
    pool: PgPool,
    query: ListProposalsQuery,
) -> Result<Vec<ProposalListItem>, ListProposalsError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        r#"
        SELECT p.id, p.dataset_id, m.title::text AS dataset_title,
               p.proposed_by_user_id, u.email::text AS proposer_email,
               p.status, p.created_at, p.decided_at
        FROM community_dataset_proposals p
        JOIN users u ON u.id = p.proposed_by_user_id
        LEFT JOIN dataset_metadata m ON m.dataset_id = p.dataset_id
        WHERE p.community_id =
        "#,
    );
    builder.push_bind(query.community_id);

    if let Some(status) = query.status {
        builder.push(" AND p.status = ");
        builder.push_bind(status.as_str());
    }

    builder.push(" ORDER BY p.created_at DESC, p.id");

    let items = builder
        .build_query_as::<ProposalListItem>()
        .fetch_all(&pool)
        .await?;

    Ok(items)
}
