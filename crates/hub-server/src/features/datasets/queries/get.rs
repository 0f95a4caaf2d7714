//! Get dataset query

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::datasets::types::{
    AuthorInfo, CommunityRef, DataCategory, DatasetDetail, DatasetMetadata, FileInfo,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDatasetQuery {
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum GetDatasetError {
    #[error("Dataset '{0}' not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<DatasetDetail, GetDatasetError>> for GetDatasetQuery {}

impl crate::cqrs::middleware::Query for GetDatasetQuery {}

#[tracing::instrument(skip(pool), fields(dataset_id = %query.id))]
pub async fn handle(pool: PgPool, query: GetDatasetQuery) -> Result<DatasetDetail, GetDatasetError> {
    load_detail(&pool, query.id)
        .await?
        .ok_or(GetDatasetError::NotFound(query.id))
}

#[derive(Debug, sqlx::FromRow)]
struct DetailRow {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    metadata_id: Option<Uuid>,
    title: Option<String>,
    description: Option<String>,
    tags: Option<String>,
    data_category: Option<String>,
    dataset_type: Option<String>,
    dataset_doi: Option<String>,
    is_latest: Option<bool>,
    download_count: i64,
    view_count: i64,
    community_id: Option<Uuid>,
    community_name: Option<String>,
}

/// Load a dataset with its metadata, authors, files, counters and community.
pub async fn load_detail(pool: &PgPool, id: Uuid) -> Result<Option<DatasetDetail>, sqlx::Error> {
    let row = sqlx::query_as::<_, DetailRow>(
        r#"
        SELECT d.id, d.user_id, d.created_at,
               m.id AS metadata_id, m.title, m.description, m.tags, m.data_category,
               m.dataset_type, m.dataset_doi, m.is_latest,
               (SELECT COUNT(*) FROM dataset_download_records r WHERE r.dataset_id = d.id) AS download_count,
               (SELECT COUNT(*) FROM dataset_view_records r WHERE r.dataset_id = d.id) AS view_count,
               ac.id AS community_id, ac.name AS community_name
        FROM datasets d
        LEFT JOIN dataset_metadata m ON m.dataset_id = d.id
        LEFT JOIN LATERAL (
            SELECT c.id, c.name::text AS name
            FROM community_dataset_proposals p
            JOIN communities c ON c.id = p.community_id
            WHERE p.dataset_id = d.id AND p.status = 'accepted'
            LIMIT 1
        ) ac ON TRUE
        WHERE d.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let files = sqlx::query_as::<_, FileInfo>(
        r#"
        SELECT fm.id, fm.filename, fm.title, fm.description, fm.tags, fm.publication_doi
        FROM dataset_files f
        JOIN file_metadata fm ON fm.dataset_file_id = f.id
        WHERE f.dataset_id = $1
        ORDER BY fm.filename, fm.id
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let metadata = match row.metadata_id {
        Some(metadata_id) => {
            let authors = sqlx::query_as::<_, AuthorInfo>(
                r#"
                SELECT name, affiliation, orcid
                FROM authors
                WHERE dataset_metadata_id = $1
                ORDER BY position, id
                "#,
            )
            .bind(metadata_id)
            .fetch_all(pool)
            .await?;

            let data_category = match row.data_category.as_deref() {
                Some(raw) => raw
                    .parse::<DataCategory>()
                    .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
                None => DataCategory::default(),
            };

            Some(DatasetMetadata {
                title: row.title.unwrap_or_default(),
                description: row.description.unwrap_or_default(),
                tags: row.tags,
                data_category,
                dataset_type: row
                    .dataset_type
                    .unwrap_or_else(|| hub_common::kinds::DEFAULT_KIND.to_string()),
                dataset_doi: row.dataset_doi,
                is_latest: row.is_latest.unwrap_or(true),
                authors,
            })
        },
        None => None,
    };

    Ok(Some(DatasetDetail {
        id: row.id,
        user_id: row.user_id,
        created_at: row.created_at,
        metadata,
        files,
        download_count: row.download_count,
        view_count: row.view_count,
        community: CommunityRef::from_columns(row.community_id, row.community_name),
    }))
}
