//! Dataset types shared by the discovery features
//!
//! Explore, trending, related and latest all return [`DatasetSummary`]
//! values built from the same projection ([`SUMMARY_COLUMNS`] over
//! [`SUMMARY_FROM`]), so a dataset renders identically wherever it shows up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of data a dataset holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    #[default]
    General,
    Sales,
    UserReviews,
    Other,
}

impl DataCategory {
    pub const ALL: [DataCategory; 4] = [
        DataCategory::General,
        DataCategory::Sales,
        DataCategory::UserReviews,
        DataCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DataCategory::General => "general",
            DataCategory::Sales => "sales",
            DataCategory::UserReviews => "user_reviews",
            DataCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for DataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown data category: {0}")]
pub struct UnknownDataCategory(pub String);

impl std::str::FromStr for DataCategory {
    type Err = UnknownDataCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownDataCategory(s.to_string()))
    }
}

impl TryFrom<String> for DataCategory {
    type Error = UnknownDataCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A community a dataset has been accepted into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityRef {
    pub id: Uuid,
    pub name: String,
}

impl CommunityRef {
    pub(crate) fn from_columns(id: Option<Uuid>, name: Option<String>) -> Option<Self> {
        match (id, name) {
            (Some(id), Some(name)) => Some(Self { id, name }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthorInfo {
    pub name: String,
    pub affiliation: Option<String>,
    pub orcid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FileInfo {
    pub id: Uuid,
    pub filename: String,
    pub title: String,
    pub description: String,
    pub tags: Option<String>,
    pub publication_doi: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub title: String,
    pub description: String,
    pub tags: Option<String>,
    pub data_category: DataCategory,
    pub dataset_type: String,
    pub dataset_doi: Option<String>,
    pub is_latest: bool,
    pub authors: Vec<AuthorInfo>,
}

/// Full view of one dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub metadata: Option<DatasetMetadata>,
    pub files: Vec<FileInfo>,
    pub download_count: i64,
    pub view_count: i64,
    pub community: Option<CommunityRef>,
}

impl DatasetDetail {
    /// A dataset is synchronized once it has been given a DOI.
    pub fn is_synchronized(&self) -> bool {
        self.metadata
            .as_ref()
            .is_some_and(|m| m.dataset_doi.is_some())
    }
}

/// Listing view of a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub data_category: DataCategory,
    pub dataset_doi: Option<String>,
    pub authors: Vec<String>,
    pub filenames: Vec<String>,
    pub download_count: i64,
    pub view_count: i64,
    pub community: Option<CommunityRef>,
}

/// Columns selected for a [`SummaryRow`]. Expects the aliases of [`SUMMARY_FROM`].
pub const SUMMARY_COLUMNS: &str = r#"
    d.id, d.user_id, d.created_at,
    m.title, m.description, m.tags, m.data_category, m.dataset_doi,
    ARRAY(
        SELECT a.name::text FROM authors a
        WHERE a.dataset_metadata_id = m.id
        ORDER BY a.position, a.id
    ) AS authors,
    ARRAY(
        SELECT fm.filename::text FROM dataset_files f
        JOIN file_metadata fm ON fm.dataset_file_id = f.id
        WHERE f.dataset_id = d.id
        ORDER BY fm.filename, fm.id
    ) AS filenames,
    (SELECT COUNT(*) FROM dataset_download_records r WHERE r.dataset_id = d.id) AS download_count,
    (SELECT COUNT(*) FROM dataset_view_records r WHERE r.dataset_id = d.id) AS view_count,
    ac.id AS community_id, ac.name AS community_name
"#;

/// Datasets with their metadata and accepted community (if any).
pub const SUMMARY_FROM: &str = r#"
    FROM datasets d
    JOIN dataset_metadata m ON m.dataset_id = d.id
    LEFT JOIN LATERAL (
        SELECT c.id, c.name::text AS name
        FROM community_dataset_proposals p
        JOIN communities c ON c.id = p.community_id
        WHERE p.dataset_id = d.id AND p.status = 'accepted'
        LIMIT 1
    ) ac ON TRUE
"#;

#[derive(Debug, sqlx::FromRow)]
pub struct SummaryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub tags: Option<String>,
    #[sqlx(try_from = "String")]
    pub data_category: DataCategory,
    pub dataset_doi: Option<String>,
    pub authors: Vec<String>,
    pub filenames: Vec<String>,
    pub download_count: i64,
    pub view_count: i64,
    pub community_id: Option<Uuid>,
    pub community_name: Option<String>,
}

impl From<SummaryRow> for DatasetSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            tags: row
                .tags
                .as_deref()
                .map(hub_common::text::split_list)
                .unwrap_or_default(),
            title: row.title,
            description: row.description,
            data_category: row.data_category,
            dataset_doi: row.dataset_doi,
            authors: row.authors,
            filenames: row.filenames,
            download_count: row.download_count,
            view_count: row.view_count,
            community: CommunityRef::from_columns(row.community_id, row.community_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> SummaryRow {
        SummaryRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
            title: "Steam top sellers".to_string(),
            description: "Weekly snapshot".to_string(),
            tags: Some("indie, rpg ,".to_string()),
            data_category: DataCategory::Sales,
            dataset_doi: None,
            authors: vec!["Alice Wonderland".to_string()],
            filenames: vec!["games.csv".to_string()],
            download_count: 2,
            view_count: 3,
            community_id: None,
            community_name: None,
        }
    }

    #[test]
    fn test_data_category_parse_is_case_insensitive() {
        assert_eq!("User_Reviews".parse::<DataCategory>().unwrap(), DataCategory::UserReviews);
        assert_eq!(" sales ".parse::<DataCategory>().unwrap(), DataCategory::Sales);
        assert!("any".parse::<DataCategory>().is_err());
    }

    #[test]
    fn test_data_category_serde_matches_storage() {
        for category in DataCategory::ALL {
            let json = serde_json::to_value(category).unwrap();
            assert_eq!(json, serde_json::json!(category.as_str()));
        }
    }

    #[test]
    fn test_summary_from_row_splits_tags() {
        let summary = DatasetSummary::from(row());
        assert_eq!(summary.tags, vec!["indie", "rpg"]);
        assert!(summary.community.is_none());
    }

    #[test]
    fn test_summary_equality() {
        let summary = DatasetSummary::from(row());
        let same = summary.clone();
        assert_eq!(summary, same);

        let other = DatasetSummary {
            view_count: summary.view_count + 1,
            ..same
        };
        assert_ne!(summary, other);
    }

    #[test]
    fn test_summary_from_row_with_community() {
        let community_id = Uuid::new_v4();
        let summary = DatasetSummary::from(SummaryRow {
            community_id: Some(community_id),
            community_name: Some("Indie Games".to_string()),
            ..row()
        });
        assert_eq!(
            summary.community,
            Some(CommunityRef {
                id: community_id,
                name: "Indie Games".to_string()
            })
        );
    }

    #[test]
    fn test_detail_synchronized_requires_doi() {
        let mut detail = DatasetDetail {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
            metadata: None,
            files: vec![],
            download_count: 0,
            view_count: 0,
            community: None,
        };
        assert!(!detail.is_synchronized());

        detail.metadata = Some(DatasetMetadata {
            title: "t".to_string(),
            description: "d".to_string(),
            tags: None,
            data_category: DataCategory::General,
            dataset_type: "steamcsv".to_string(),
            dataset_doi: Some("10.1234/hub.1".to_string()),
            is_latest: true,
            authors: vec![],
        });
        assert!(detail.is_synchronized());
    }
}
