//! Latest synchronized datasets
//!
//! The most recently created datasets that already carry a DOI. Also the
//! fallback source for trending.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::datasets::types::{DatasetSummary, SummaryRow, SUMMARY_COLUMNS, SUMMARY_FROM};

pub const DEFAULT_LATEST_LIMIT: i64 = 5;
pub const MAX_LATEST_LIMIT: i64 = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatestDatasetsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl LatestDatasetsQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LATEST_LIMIT)
            .clamp(1, MAX_LATEST_LIMIT)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LatestDatasetsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<DatasetSummary>, LatestDatasetsError>> for LatestDatasetsQuery {}

impl crate::cqrs::middleware::Query for LatestDatasetsQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: LatestDatasetsQuery,
) -> Result<Vec<DatasetSummary>, LatestDatasetsError> {
    Ok(latest_synchronized(&pool, query.limit()).await?)
}

pub async fn latest_synchronized(pool: &PgPool, limit: i64) -> Result<Vec<DatasetSummary>, sqlx::Error> {
    let sql = format!(
        "SELECT {} {} WHERE m.dataset_doi IS NOT NULL ORDER BY d.created_at DESC, d.id LIMIT $1",
        SUMMARY_COLUMNS, SUMMARY_FROM
    );

    let rows = sqlx::query_as::<_, SummaryRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(DatasetSummary::from).collect())
}
