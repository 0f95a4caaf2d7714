//! Record dataset views and downloads
//!
//! One record per (dataset, cookie). A caller without a usable cookie gets a
//! freshly minted one, which the HTTP layer sends back to the client.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::error_helpers::map_foreign_key_violation;

pub const MAX_COOKIE_LENGTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    View,
    Download,
}

impl RecordKind {
    /// Name of the cookie carrying the record token
    pub fn cookie_name(self) -> &'static str {
        match self {
            RecordKind::View => "view_cookie",
            RecordKind::Download => "download_cookie",
        }
    }

    fn insert_sql(self) -> &'static str {
        match self {
            RecordKind::View => {
                "INSERT INTO dataset_view_records (dataset_id, view_cookie) VALUES ($1, $2) \
                 ON CONFLICT (dataset_id, view_cookie) DO NOTHING"
            },
            RecordKind::Download => {
                "INSERT INTO dataset_download_records (dataset_id, download_cookie) VALUES ($1, $2) \
                 ON CONFLICT (dataset_id, download_cookie) DO NOTHING"
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordActivityCommand {
    pub dataset_id: Uuid,
    pub kind: RecordKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordActivityResponse {
    pub cookie: String,
    /// False when this cookie had already been recorded for the dataset
    pub recorded: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordActivityError {
    #[error("Dataset '{0}' not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<RecordActivityResponse, RecordActivityError>> for RecordActivityCommand {}

impl crate::cqrs::middleware::Command for RecordActivityCommand {}

impl RecordActivityCommand {
    pub fn view(dataset_id: Uuid, cookie: Option<String>) -> Self {
        Self {
            dataset_id,
            kind: RecordKind::View,
            cookie,
        }
    }

    pub fn download(dataset_id: Uuid, cookie: Option<String>) -> Self {
        Self {
            dataset_id,
            kind: RecordKind::Download,
            cookie,
        }
    }

    /// The cookie to record under, minting one when the caller's is unusable.
    pub fn resolve_cookie(&self) -> String {
        match self.cookie.as_deref().map(str::trim) {
            Some(cookie) if !cookie.is_empty() && cookie.len() <= MAX_COOKIE_LENGTH => {
                cookie.to_string()
            },
            _ => Uuid::new_v4().to_string(),
        }
    }
}

#[tracing::instrument(skip(pool, command), fields(dataset_id = %command.dataset_id, kind = ?command.kind))]
pub async fn handle(
    pool: PgPool,
    command: RecordActivityCommand,
) -> Result<RecordActivityResponse, RecordActivityError> {
    let cookie = command.resolve_cookie();

    let result = sqlx::query(command.kind.insert_sql())
        .bind(command.dataset_id)
        .bind(&cookie)
        .execute(&pool)
        .await
        .map_err(|e| {
            map_foreign_key_violation(
                e,
                RecordActivityError::NotFound(command.dataset_id),
                RecordActivityError::Database,
            )
        })?;

    let recorded = result.rows_affected() > 0;
    if recorded {
        tracing::debug!(cookie = %cookie, "Activity recorded");
    }

    Ok(RecordActivityResponse { cookie, recorded })
}
