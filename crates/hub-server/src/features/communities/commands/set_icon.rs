//! Upload a community icon
//!
//! Only the community's responsible user may replace its icon. The upload is
//! checked by extension, by size and by its leading magic bytes before it is
//! written to `communities/community_{id}/{sanitized filename}`.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::communities::types::{
    sanitize_filename, Community, IconFormat, COMMUNITY_COLUMNS, MAX_ICON_BYTES,
};
use crate::storage::{community_icon_key, Storage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetIconCommand {
    pub community_id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub filename: String,
    #[serde(skip)]
    pub content: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum SetIconError {
    #[error("Community '{0}' not found")]
    NotFound(Uuid),
    #[error("Only the community's responsible user can change its icon")]
    Forbidden,
    #[error("Icon image is required.")]
    Required,
    #[error("Invalid icon format. Allowed: png, jpg, jpeg, gif, webp.")]
    InvalidFormat,
    #[error("Icon file is too large (max 5MB).")]
    TooLarge,
    #[error("Icon file is not a valid image.")]
    Corrupt,
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Community, SetIconError>> for SetIconCommand {}

impl crate::cqrs::middleware::Command for SetIconCommand {}

impl SetIconCommand {
    /// Check the upload itself; returns the detected image format.
    pub fn validate(&self) -> Result<IconFormat, SetIconError> {
        if self.filename.trim().is_empty() || self.content.is_empty() {
            return Err(SetIconError::Required);
        }
        IconFormat::from_filename(&self.filename).ok_or(SetIconError::InvalidFormat)?;
        if self.content.len() > MAX_ICON_BYTES {
            return Err(SetIconError::TooLarge);
        }
        IconFormat::sniff(&self.content).ok_or(SetIconError::Corrupt)
    }
}

#[tracing::instrument(
    skip(pool, storage, command),
    fields(community_id = %command.community_id, size = command.content.len())
)]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    command: SetIconCommand,
) -> Result<Community, SetIconError> {
    let responsible: Option<Uuid> =
        sqlx::query_scalar("SELECT responsible_user_id FROM communities WHERE id = $1")
            .bind(command.community_id)
            .fetch_optional(&pool)
            .await?;

    match responsible {
        None => return Err(SetIconError::NotFound(command.community_id)),
        Some(id) if id != command.user_id => return Err(SetIconError::Forbidden),
        Some(_) => {},
    }

    let format = command.validate()?;

    let mut filename = sanitize_filename(&command.filename);
    if IconFormat::from_filename(&filename).is_none() {
        filename = format!("icon.{}", format.extension());
    }
    let key = community_icon_key(command.community_id, &filename);

    storage
        .upload(&key, command.content, Some(format.content_type().to_string()))
        .await?;

    let community = sqlx::query_as::<_, Community>(&format!(
        "UPDATE communities c SET icon_key = $2 WHERE c.id = $1 RETURNING {}",
        COMMUNITY_COLUMNS
    ))
    .bind(command.community_id)
    .bind(&key)
    .fetch_one(&pool)
    .await?;

    tracing::info!(key = %key, "Community icon updated");

    Ok(community)
}
