//! Trending ranking
//!
//! Datasets are ranked by view or download records since a cutoff. Datasets
//! without recent records rank with 0. The ranking never fails: on any error
//! the latest synchronized datasets are returned with metric 0, and if that
//! also fails the result is empty.

use chrono::{DateTime, Duration, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::future::Future;

use crate::features::datasets::queries::latest::latest_synchronized;
use crate::features::datasets::types::{DatasetSummary, SummaryRow, SUMMARY_COLUMNS, SUMMARY_FROM};
use crate::features::trending::types::{
    TrendingEntry, TrendingItem, TrendingMetric, TrendingPeriod, TrendingResponse,
    DEFAULT_TRENDING_LIMIT, MAX_TRENDING_LIMIT,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendingQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl TrendingQuery {
    pub fn by(&self) -> &str {
        self.by.as_deref().unwrap_or("views")
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_TRENDING_LIMIT)
            .clamp(1, MAX_TRENDING_LIMIT)
    }
}

impl Request<TrendingResponse> for TrendingQuery {}

impl crate::cqrs::middleware::Query for TrendingQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: TrendingQuery) -> TrendingResponse {
    let period = TrendingPeriod::parse(query.period.as_deref());
    let items = trending_datasets(&pool, period.days(), query.by(), query.limit()).await;

    TrendingResponse {
        by: query.by().to_string(),
        period,
        items: items.into_iter().map(TrendingEntry::from).collect(),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TrendingRow {
    #[sqlx(flatten)]
    summary: SummaryRow,
    metric: i64,
}

/// Start of a `period_days` window ending at `now`. `None` when the window
/// reaches past the representable range, meaning every record counts.
pub(crate) fn activity_cutoff(now: DateTime<Utc>, period_days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(period_days).and_then(|period| now.checked_sub_signed(period))
}

/// Rank every dataset by `metric` records newer than `period_days` days.
pub async fn rank_by_activity(
    pool: &PgPool,
    period_days: i64,
    metric: TrendingMetric,
    limit: i64,
) -> Result<Vec<TrendingItem>, sqlx::Error> {
    let cutoff = activity_cutoff(Utc::now(), period_days);
    let (table, timestamp) = metric.source();

    let sql = format!(
        r#"
        WITH recent AS (
            SELECT dataset_id, COUNT(*) AS hits
            FROM {table}
            WHERE $1::timestamptz IS NULL OR {timestamp} >= $1
            GROUP BY dataset_id
        )
        SELECT {columns}, COALESCE(recent.hits, 0) AS metric
        {from}
        LEFT JOIN recent ON recent.dataset_id = d.id
        ORDER BY COALESCE(recent.hits, 0) DESC, d.created_at DESC, d.id
        LIMIT $2
        "#,
        table = table,
        timestamp = timestamp,
        columns = SUMMARY_COLUMNS,
        from = SUMMARY_FROM,
    );

    let rows = sqlx::query_as::<_, TrendingRow>(&sql)
        .bind(cutoff)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| TrendingItem {
            dataset: DatasetSummary::from(row.summary),
            metric: row.metric,
        })
        .collect())
}

/// Await `primary`; on error log it and build metric-0 items from `fallback`.
pub async fn rank_or_fallback<P, E, F, Fut, E2>(primary: P, fallback: F) -> Vec<TrendingItem>
where
    P: Future<Output = Result<Vec<TrendingItem>, E>>,
    E: std::fmt::Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<DatasetSummary>, E2>>,
    E2: std::fmt::Display,
{
    match primary.await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, "Trending ranking failed, falling back to latest datasets");
            match fallback().await {
                Ok(latest) => latest
                    .into_iter()
                    .map(|mut dataset| {
                        dataset.community = None;
                        TrendingItem { dataset, metric: 0 }
                    })
                    .collect(),
                Err(e) => {
                    tracing::error!(error = %e, "Trending fallback failed");
                    Vec::new()
                },
            }
        },
    }
}

/// Trending datasets for `by` (`views` or `downloads`). Never fails.
pub async fn trending_datasets(
    pool: &PgPool,
    period_days: i64,
    by: &str,
    limit: i64,
) -> Vec<TrendingItem> {
    let primary = async {
        match TrendingMetric::parse(by) {
            Some(metric) => rank_by_activity(pool, period_days, metric, limit).await,
            None => Ok(Vec::new()),
        }
    };

    rank_or_fallback(primary, || latest_synchronized(pool, limit)).await
}
