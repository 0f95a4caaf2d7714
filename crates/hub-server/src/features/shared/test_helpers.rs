//! Test helpers and fixtures for database tests
//!
//! Provides builders that insert users, datasets and communities directly,
//! so feature tests can seed exactly the rows they need.
//!
//! # Examples
//!
//! ```rust,ignore
//! use hub_server::features::shared::test_helpers::*;
//!
//! #[sqlx::test(migrations = "../../migrations")]
//! async fn test_something(pool: PgPool) -> sqlx::Result<()> {
//!     let owner = TestUser::new("owner@example.com").insert(&pool).await?;
//!     let dataset = TestDataset::new(&owner, "Steam catalogue")
//!         .with_tags("indie")
//!         .with_views(3)
//!         .insert(&pool)
//!         .await?;
//!     // ... test logic ...
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Builder for creating test users
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

impl TestUser {
    pub fn new(email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<Self> {
        sqlx::query("INSERT INTO users (id, email, name) VALUES ($1, $2, $3)")
            .bind(self.id)
            .bind(&self.email)
            .bind(&self.name)
            .execute(pool)
            .await?;
        Ok(self)
    }
}

/// Builder for creating test datasets with metadata, authors and files
#[derive(Debug, Clone)]
pub struct TestDataset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: Option<String>,
    pub data_category: String,
    pub dataset_doi: Option<String>,
    pub created_at: DateTime<Utc>,
    pub authors: Vec<(String, Option<String>)>,
    pub files: Vec<String>,
    pub views: u32,
    pub downloads: u32,
    pub with_metadata: bool,
}

impl TestDataset {
    pub fn new(owner: &TestUser, title: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: owner.id,
            title: title.to_string(),
            description: format!("{} description", title),
            tags: None,
            data_category: "general".to_string(),
            dataset_doi: Some(format!("10.1234/hub.{}", Uuid::new_v4().simple())),
            created_at: Utc::now(),
            authors: Vec::new(),
            files: Vec::new(),
            views: 0,
            downloads: 0,
            with_metadata: true,
        }
    }

    pub fn with_tags(mut self, tags: &str) -> Self {
        self.tags = Some(tags.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.data_category = category.to_string();
        self
    }

    pub fn with_author(mut self, name: &str) -> Self {
        self.authors.push((name.to_string(), None));
        self
    }

    pub fn with_orcid_author(mut self, name: &str, orcid: &str) -> Self {
        self.authors.push((name.to_string(), Some(orcid.to_string())));
        self
    }

    pub fn with_file(mut self, filename: &str) -> Self {
        self.files.push(filename.to_string());
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn unsynchronized(mut self) -> Self {
        self.dataset_doi = None;
        self
    }

    pub fn without_metadata(mut self) -> Self {
        self.with_metadata = false;
        self
    }

    pub fn with_views(mut self, views: u32) -> Self {
        self.views = views;
        self
    }

    pub fn with_downloads(mut self, downloads: u32) -> Self {
        self.downloads = downloads;
        self
    }

    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<Self> {
        sqlx::query("INSERT INTO datasets (id, user_id, created_at) VALUES ($1, $2, $3)")
            .bind(self.id)
            .bind(self.user_id)
            .bind(self.created_at)
            .execute(pool)
            .await?;

        if self.with_metadata {
            let metadata_id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO dataset_metadata (dataset_id, title, description, tags, data_category, dataset_doi)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(self.id)
            .bind(&self.title)
            .bind(&self.description)
            .bind(&self.tags)
            .bind(&self.data_category)
            .bind(&self.dataset_doi)
            .fetch_one(pool)
            .await?;

            for (position, (name, orcid)) in self.authors.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO authors (dataset_metadata_id, name, orcid, position) VALUES ($1, $2, $3, $4)",
                )
                .bind(metadata_id)
                .bind(name)
                .bind(orcid)
                .bind(position as i32)
                .execute(pool)
                .await?;
            }
        }

        for filename in &self.files {
            let file_id: Uuid =
                sqlx::query_scalar("INSERT INTO dataset_files (dataset_id) VALUES ($1) RETURNING id")
                    .bind(self.id)
                    .fetch_one(pool)
                    .await?;
            sqlx::query(
                "INSERT INTO file_metadata (dataset_file_id, filename, title) VALUES ($1, $2, $2)",
            )
            .bind(file_id)
            .bind(filename)
            .execute(pool)
            .await?;
        }

        for _ in 0..self.views {
            record(pool, "dataset_view_records", "view_cookie", self.id).await?;
        }
        for _ in 0..self.downloads {
            record(pool, "dataset_download_records", "download_cookie", self.id).await?;
        }

        Ok(self)
    }
}

async fn record(pool: &PgPool, table: &str, cookie_column: &str, dataset_id: Uuid) -> sqlx::Result<()> {
    let sql = format!("INSERT INTO {} (dataset_id, {}) VALUES ($1, $2)", table, cookie_column);
    sqlx::query(&sql)
        .bind(dataset_id)
        .bind(Uuid::new_v4().to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Builder for creating test communities
#[derive(Debug, Clone)]
pub struct TestCommunity {
    pub id: Uuid,
    pub name: String,
    pub responsible_user_id: Uuid,
}

impl TestCommunity {
    pub fn new(responsible: &TestUser, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            responsible_user_id: responsible.id,
        }
    }

    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<Self> {
        sqlx::query(
            "INSERT INTO communities (id, name, description, responsible_user_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(format!("{} community", self.name))
        .bind(self.responsible_user_id)
        .execute(pool)
        .await?;
        Ok(self)
    }

    /// Insert an accepted proposal for `dataset` directly, bypassing the workflow.
    pub async fn accept(&self, pool: &PgPool, dataset: &TestDataset) -> sqlx::Result<Uuid> {
        sqlx::query_scalar(
            r#"
            INSERT INTO community_dataset_proposals
                (dataset_id, community_id, proposed_by_user_id, status, decided_at)
            VALUES ($1, $2, $3, 'accepted', NOW())
            RETURNING id
            "#,
        )
        .bind(dataset.id)
        .bind(self.id)
        .bind(dataset.user_id)
        .fetch_one(pool)
        .await
    }
}

/// Titles of `items`, in order.
pub fn titles<'a, I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a crate::features::datasets::types::DatasetSummary>,
{
    items.into_iter().map(|s| s.title.clone()).collect()
}
