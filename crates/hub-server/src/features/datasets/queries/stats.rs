//! Platform statistics

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformStatsQuery;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub synchronized_datasets: i64,
    pub views: i64,
    pub downloads: i64,
    pub communities: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformStatsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<PlatformStats, PlatformStatsError>> for PlatformStatsQuery {}

impl crate::cqrs::middleware::Query for PlatformStatsQuery {}

async fn count(pool: &PgPool, sql: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await
}

#[tracing::instrument(skip(pool, _query))]
pub async fn handle(
    pool: PgPool,
    _query: PlatformStatsQuery,
) -> Result<PlatformStats, PlatformStatsError> {
    let (synchronized, views, downloads, communities) = tokio::join!(
        count(&pool, "SELECT COUNT(*) FROM dataset_metadata WHERE dataset_doi IS NOT NULL"),
        count(&pool, "SELECT COUNT(*) FROM dataset_view_records"),
        count(&pool, "SELECT COUNT(*) FROM dataset_download_records"),
        count(&pool, "SELECT COUNT(*) FROM communities"),
    );

    Ok(PlatformStats {
        synchronized_datasets: synchronized?,
        views: views?,
        downloads: downloads?,
        communities: communities?,
    })
}
