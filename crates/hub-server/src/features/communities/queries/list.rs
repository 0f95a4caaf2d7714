//! List communities, newest first

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::features::communities::types::{Community, COMMUNITY_COLUMNS};

/// All communities, or only those `responsible_user_id` manages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCommunitiesQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible_user_id: Option<Uuid>,
}

impl ListCommunitiesQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn managed_by(user_id: Uuid) -> Self {
        Self {
            responsible_user_id: Some(user_id),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListCommunitiesError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<Community>, ListCommunitiesError>> for ListCommunitiesQuery {}

impl crate::cqrs::middleware::Query for ListCommunitiesQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ListCommunitiesQuery,
) -> Result<Vec<Community>, ListCommunitiesError> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM communities c", COMMUNITY_COLUMNS));

    if let Some(user_id) = query.responsible_user_id {
        builder.push(" WHERE c.responsible_user_id = ");
        builder.push_bind(user_id);
    }

    builder.push(" ORDER BY c.created_at DESC, c.id");

    let communities = builder
        .build_query_as::<Community>()
        .fetch_all(&pool)
        .await?;

    Ok(communities)
}
