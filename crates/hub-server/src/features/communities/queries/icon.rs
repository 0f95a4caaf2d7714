//! Read back a community icon

use sqlx::PgPool;
use uuid::Uuid;

use crate::features::communities::types::IconFormat;
use crate::storage::{Storage, StoredObject};

#[derive(Debug, thiserror::Error)]
pub enum GetIconError {
    #[error("Community '{0}' has no icon")]
    NotFound(Uuid),
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Icon bytes and content type. Missing communities and communities without
/// an icon are both `NotFound`.
#[tracing::instrument(skip(pool, storage))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    community_id: Uuid,
) -> Result<StoredObject, GetIconError> {
    let key = sqlx::query_scalar::<_, Option<String>>(
        "SELECT icon_key::text FROM communities WHERE id = $1",
    )
    .bind(community_id)
    .fetch_optional(&pool)
    .await?
    .flatten();

    let key = key.ok_or(GetIconError::NotFound(community_id))?;
    let mut object = storage.download(&key).await?;

    if object.content_type.is_none() {
        object.content_type = IconFormat::sniff(&object.data).map(|f| f.content_type().to_string());
    }

    Ok(object)
}
