//! Related-dataset suggestions
//!
//! Candidates come from three independent signals: shared authors (name or
//! ORCID), shared tags and shared accepted community. The union is returned
//! most-downloaded first. Only synchronized datasets are suggested and the
//! source dataset never is.

use sqlx::PgPool;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::features::datasets::types::{
    DatasetDetail, DatasetSummary, SummaryRow, SUMMARY_COLUMNS, SUMMARY_FROM,
};
use hub_common::text::{contains_pattern, normalize_tags, normalize_values};

pub const DEFAULT_RELATED_LIMIT: i64 = 3;

/// Signals extracted from the source dataset. Empty sets issue no query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelatedSignals {
    pub dataset_id: Uuid,
    pub author_names: BTreeSet<String>,
    pub author_orcids: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub community_ids: BTreeSet<Uuid>,
}

impl RelatedSignals {
    /// `None` when the dataset has no metadata to relate by
    pub fn from_detail(detail: &DatasetDetail) -> Option<Self> {
        let metadata = detail.metadata.as_ref()?;

        Some(Self {
            dataset_id: detail.id,
            author_names: normalize_values(metadata.authors.iter().map(|a| Some(a.name.as_str()))),
            author_orcids: normalize_values(metadata.authors.iter().map(|a| a.orcid.as_deref())),
            tags: normalize_tags(metadata.tags.as_deref()),
            community_ids: detail.community.iter().map(|c| c.id).collect(),
        })
    }
}

async fn author_related_ids(pool: &PgPool, signals: &RelatedSignals) -> Result<Vec<Uuid>, sqlx::Error> {
    if signals.author_names.is_empty() && signals.author_orcids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_scalar(
        r#"
        SELECT DISTINCT d.id
        FROM datasets d
        JOIN dataset_metadata m ON m.dataset_id = d.id
        JOIN authors a ON a.dataset_metadata_id = m.id
        WHERE d.id <> $1
          AND m.dataset_doi IS NOT NULL
          AND (lower(a.name) = ANY($2) OR lower(a.orcid) = ANY($3))
        "#,
    )
    .bind(signals.dataset_id)
    .bind(signals.author_names.iter().cloned().collect::<Vec<_>>())
    .bind(signals.author_orcids.iter().cloned().collect::<Vec<_>>())
    .fetch_all(pool)
    .await
}

async fn tag_related_ids(pool: &PgPool, signals: &RelatedSignals) -> Result<Vec<Uuid>, sqlx::Error> {
    if signals.tags.is_empty() {
        return Ok(Vec::new());
    }

    let patterns: Vec<String> = signals.tags.iter().map(|t| contains_pattern(t)).collect();

    sqlx::query_scalar(
        r#"
        SELECT d.id
        FROM datasets d
        JOIN dataset_metadata m ON m.dataset_id = d.id
        WHERE d.id <> $1
          AND m.dataset_doi IS NOT NULL
          AND lower(m.tags) LIKE ANY($2)
        "#,
    )
    .bind(signals.dataset_id)
    .bind(patterns)
    .fetch_all(pool)
    .await
}

async fn community_related_ids(
    pool: &PgPool,
    signals: &RelatedSignals,
) -> Result<Vec<Uuid>, sqlx::Error> {
    if signals.community_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_scalar(
        r#"
        SELECT DISTINCT d.id
        FROM datasets d
        JOIN dataset_metadata m ON m.dataset_id = d.id
        JOIN community_dataset_proposals p ON p.dataset_id = d.id
        WHERE d.id <> $1
          AND m.dataset_doi IS NOT NULL
          AND p.status = 'accepted'
          AND p.community_id = ANY($2)
        "#,
    )
    .bind(signals.dataset_id)
    .bind(signals.community_ids.iter().copied().collect::<Vec<_>>())
    .fetch_all(pool)
    .await
}

/// Datasets related to `dataset`, at most `limit` of them (`None` for all).
#[tracing::instrument(skip(pool, dataset), fields(dataset_id = ?dataset.map(|d| d.id)))]
pub async fn get_related_datasets(
    pool: &PgPool,
    dataset: Option<&DatasetDetail>,
    limit: Option<i64>,
) -> Result<Vec<DatasetSummary>, sqlx::Error> {
    let Some(signals) = dataset.and_then(RelatedSignals::from_detail) else {
        return Ok(Vec::new());
    };

    let mut candidates: BTreeSet<Uuid> = BTreeSet::new();
    candidates.extend(author_related_ids(pool, &signals).await?);
    candidates.extend(tag_related_ids(pool, &signals).await?);
    candidates.extend(community_related_ids(pool, &signals).await?);

    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT {} {} WHERE d.id = ANY($1) AND m.dataset_doi IS NOT NULL \
         ORDER BY download_count DESC, d.created_at DESC, d.id LIMIT $2",
        SUMMARY_COLUMNS, SUMMARY_FROM
    );

    let rows = sqlx::query_as::<_, SummaryRow>(&sql)
        .bind(candidates.into_iter().collect::<Vec<_>>())
        .bind(limit)
        .fetch_all(pool)
        .await?;

    tracing::debug!(count = rows.len(), "Related datasets found");

    Ok(rows.into_iter().map(DatasetSummary::from).collect())
}
