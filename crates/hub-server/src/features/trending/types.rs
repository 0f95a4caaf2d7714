//! Trending types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::datasets::types::DatasetSummary;

pub const DEFAULT_TRENDING_LIMIT: i64 = 5;
pub const MAX_TRENDING_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingMetric {
    Views,
    Downloads,
}

impl TrendingMetric {
    /// `None` for anything other than `views` or `downloads`
    pub fn parse(by: &str) -> Option<Self> {
        match by {
            "views" => Some(TrendingMetric::Views),
            "downloads" => Some(TrendingMetric::Downloads),
            _ => None,
        }
    }

    /// Record table and its timestamp column
    pub(crate) fn source(self) -> (&'static str, &'static str) {
        match self {
            TrendingMetric::Views => ("dataset_view_records", "viewed_at"),
            TrendingMetric::Downloads => ("dataset_download_records", "downloaded_at"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingPeriod {
    Week,
    #[default]
    Month,
}

impl TrendingPeriod {
    /// `week` is seven days, anything else thirty
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("week") => TrendingPeriod::Week,
            _ => TrendingPeriod::Month,
        }
    }

    pub fn days(self) -> i64 {
        match self {
            TrendingPeriod::Week => 7,
            TrendingPeriod::Month => 30,
        }
    }
}

/// A ranked dataset and its activity count within the period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingItem {
    pub dataset: DatasetSummary,
    pub metric: i64,
}

/// Compact item for the public trending listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingEntry {
    pub id: Uuid,
    pub title: String,
    pub first_author: Option<String>,
    pub community_name: Option<String>,
    pub community_id: Option<Uuid>,
    pub metric: i64,
    pub doi: Option<String>,
}

impl From<TrendingItem> for TrendingEntry {
    fn from(item: TrendingItem) -> Self {
        let TrendingItem { dataset, metric } = item;
        Self {
            id: dataset.id,
            title: dataset.title,
            first_author: dataset.authors.into_iter().next(),
            community_name: dataset.community.as_ref().map(|c| c.name.clone()),
            community_id: dataset.community.map(|c| c.id),
            metric,
            doi: dataset.dataset_doi,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingResponse {
    pub by: String,
    pub period: TrendingPeriod,
    pub items: Vec<TrendingEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_parse() {
        assert_eq!(TrendingMetric::parse("views"), Some(TrendingMetric::Views));
        assert_eq!(TrendingMetric::parse("downloads"), Some(TrendingMetric::Downloads));
        assert_eq!(TrendingMetric::parse("Views"), None);
        assert_eq!(TrendingMetric::parse("stars"), None);
    }

    #[test]
    fn test_period_parse() {
        assert_eq!(TrendingPeriod::parse(Some("week")).days(), 7);
        assert_eq!(TrendingPeriod::parse(Some("month")).days(), 30);
        assert_eq!(TrendingPeriod::parse(Some("year")).days(), 30);
        assert_eq!(TrendingPeriod::parse(None), TrendingPeriod::Month);
    }
}
