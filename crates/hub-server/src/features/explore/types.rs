//! Explore request types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::features::datasets::types::DataCategory;

pub const DEFAULT_EXPLORE_LIMIT: i64 = 50;
pub const MAX_EXPLORE_LIMIT: i64 = 200;

/// A list parameter given either as a comma-separated string or as an array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListParam {
    Joined(String),
    Items(Vec<String>),
}

impl ListParam {
    /// Trimmed, non-empty entries in request order
    pub fn values(&self) -> Vec<String> {
        match self {
            ListParam::Joined(raw) => hub_common::text::split_list(raw),
            ListParam::Items(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl From<&str> for ListParam {
    fn from(value: &str) -> Self {
        ListParam::Joined(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sorting {
    #[default]
    Newest,
    Oldest,
    /// Primary key order
    Id,
}

impl Sorting {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("newest") => Sorting::Newest,
            Some("oldest") => Sorting::Oldest,
            Some(_) => Sorting::Id,
        }
    }

    pub(crate) fn order_by(self) -> &'static str {
        match self {
            Sorting::Newest => " ORDER BY d.created_at DESC, d.id",
            Sorting::Oldest => " ORDER BY d.created_at ASC, d.id",
            Sorting::Id => " ORDER BY d.id",
        }
    }
}

/// Raw explore parameters, from a query string or a JSON body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExploreQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<ListParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filenames: Option<ListParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<ListParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_downloads: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_views: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

/// Normalized filter. Empty collections and `None` mean "no constraint".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreFilter {
    pub terms: Vec<String>,
    pub sorting: Sorting,
    pub data_category: Option<DataCategory>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub filenames: BTreeSet<String>,
    pub communities: Vec<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub min_downloads: Option<i64>,
    pub min_views: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ExploreFilter {
    fn default() -> Self {
        ExploreQuery::default().to_filter()
    }
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            if !raw.is_empty() {
                tracing::debug!(value = %raw, "Ignoring unparseable date");
            }
            None
        },
    }
}

impl ExploreQuery {
    pub fn to_filter(&self) -> ExploreFilter {
        let list = |param: &Option<ListParam>| param.as_ref().map(ListParam::values).unwrap_or_default();

        // "any" and unknown categories leave the category unconstrained.
        let data_category = self
            .data_category
            .as_deref()
            .and_then(|raw| raw.parse::<DataCategory>().ok());

        ExploreFilter {
            terms: self
                .query
                .as_deref()
                .map(hub_common::text::search_terms)
                .unwrap_or_default(),
            sorting: Sorting::parse(self.sorting.as_deref()),
            data_category,
            author: self
                .author
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
            tags: list(&self.tags),
            filenames: list(&self.filenames)
                .into_iter()
                .map(|name| name.to_lowercase())
                .collect(),
            communities: list(&self.community),
            date_from: parse_date(self.date_from.as_deref()),
            date_to: parse_date(self.date_to.as_deref()),
            min_downloads: self.min_downloads,
            min_views: self.min_views,
            limit: self
                .limit
                .unwrap_or(DEFAULT_EXPLORE_LIMIT)
                .clamp(1, MAX_EXPLORE_LIMIT),
            offset: self.offset.unwrap_or(0).max(0),
        }
    }
}
