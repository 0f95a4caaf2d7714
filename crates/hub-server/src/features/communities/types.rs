//! Community types and icon checks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::proposals::queries::ProposalListItem;

pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_DESCRIPTION_LENGTH: usize = 255;

/// Largest accepted icon (5 MiB)
pub const MAX_ICON_BYTES: usize = 5 * 1024 * 1024;

pub(crate) const COMMUNITY_COLUMNS: &str =
    "c.id, c.name::text AS name, c.description::text AS description, c.icon_key::text AS icon_key, c.responsible_user_id, c.created_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_key: Option<String>,
    pub responsible_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Community {
    pub fn has_icon(&self) -> bool {
        self.icon_key.is_some()
    }
}

/// A community as seen by one viewer. Proposal lists are only filled in for
/// the responsible user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityView {
    #[serde(flatten)]
    pub community: Community,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_proposals: Option<Vec<ProposalListItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_proposals: Option<Vec<ProposalListItem>>,
}

/// Supported icon image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl IconFormat {
    /// Format named by the extension of `filename`, case-insensitive
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(IconFormat::Png),
            "jpg" | "jpeg" => Some(IconFormat::Jpeg),
            "gif" => Some(IconFormat::Gif),
            "webp" => Some(IconFormat::Webp),
            _ => None,
        }
    }

    /// Format identified by the leading magic bytes of `data`
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(IconFormat::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(IconFormat::Jpeg)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(IconFormat::Gif)
        } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(IconFormat::Webp)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            IconFormat::Png => "png",
            IconFormat::Jpeg => "jpg",
            IconFormat::Gif => "gif",
            IconFormat::Webp => "webp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            IconFormat::Png => "image/png",
            IconFormat::Jpeg => "image/jpeg",
            IconFormat::Gif => "image/gif",
            IconFormat::Webp => "image/webp",
        }
    }
}

/// Reduce an uploaded filename to ASCII letters, digits, `.`, `-` and `_`.
///
/// Directory components are dropped, whitespace becomes `_`, and leading
/// dots are stripped so the result can never name a parent or hidden file.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    cleaned.trim_start_matches(['.', '_']).to_string()
}
