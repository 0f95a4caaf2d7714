//! Create dataset command
//!
//! Registers a dataset together with its metadata, authors and file
//! metadata in a single transaction. When no authors are given the owner is
//! recorded as the first author.

use hub_common::kinds::KindRegistry;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::features::datasets::types::{DataCategory, DatasetDetail};
use crate::features::shared::error_helpers::is_unique_violation;
use crate::features::shared::validation::{validate_name, NameValidationError};

pub const MAX_TITLE_LENGTH: usize = 256;
pub const MAX_FILES_PER_DATASET: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInput {
    pub filename: String,
    /// Defaults to the filename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_doi: Option<String>,
    #[serde(default)]
    pub authors: Vec<AuthorInput>,
}

/// Command to register a new dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatasetCommand {
    /// Owner, taken from the authenticated principal
    #[serde(skip)]
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default)]
    pub data_category: DataCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_doi: Option<String>,
    #[serde(default)]
    pub authors: Vec<AuthorInput>,
    #[serde(default)]
    pub files: Vec<FileInput>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateDatasetError {
    #[error("Title validation failed: {0}")]
    Title(NameValidationError),

    #[error("Description is required")]
    DescriptionRequired,

    #[error("Author name is required")]
    AuthorNameRequired,

    #[error("A dataset may contain at most {MAX_FILES_PER_DATASET} files")]
    TooManyFiles,

    #[error("File '{0}' is not a .csv file")]
    InvalidFilename(String),

    #[error("Unknown dataset type: {0}")]
    UnknownDatasetType(String),

    #[error("Owner '{0}' not found")]
    OwnerNotFound(Uuid),

    #[error("A dataset with DOI '{0}' already exists")]
    DuplicateDoi(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<DatasetDetail, CreateDatasetError>> for CreateDatasetCommand {}

impl crate::cqrs::middleware::Command for CreateDatasetCommand {}

impl CreateDatasetCommand {
    pub fn validate(&self, kinds: &KindRegistry) -> Result<(), CreateDatasetError> {
        validate_name(&self.title, MAX_TITLE_LENGTH).map_err(CreateDatasetError::Title)?;

        if self.description.trim().is_empty() {
            return Err(CreateDatasetError::DescriptionRequired);
        }

        let all_authors = self
            .authors
            .iter()
            .chain(self.files.iter().flat_map(|f| f.authors.iter()));
        for author in all_authors {
            if author.name.trim().is_empty() {
                return Err(CreateDatasetError::AuthorNameRequired);
            }
        }

        if self.files.len() > MAX_FILES_PER_DATASET {
            return Err(CreateDatasetError::TooManyFiles);
        }

        if let Some(file) = self
            .files
            .iter()
            .find(|f| !f.filename.to_ascii_lowercase().ends_with(".csv"))
        {
            return Err(CreateDatasetError::InvalidFilename(file.filename.clone()));
        }

        if let Some(ref dataset_type) = self.dataset_type {
            if !kinds.contains(dataset_type) {
                return Err(CreateDatasetError::UnknownDatasetType(dataset_type.clone()));
            }
        }

        Ok(())
    }
}

#[tracing::instrument(
    skip(pool, kinds, command),
    fields(owner_id = %command.owner_id, files = command.files.len())
)]
pub async fn handle(
    pool: PgPool,
    kinds: &KindRegistry,
    command: CreateDatasetCommand,
) -> Result<DatasetDetail, CreateDatasetError> {
    command.validate(kinds)?;

    let mut tx = pool.begin().await?;

    let owner_name: Option<String> =
        sqlx::query_scalar("SELECT COALESCE(name, email)::text FROM users WHERE id = $1")
            .bind(command.owner_id)
            .fetch_optional(&mut *tx)
            .await?;
    let owner_name = owner_name.ok_or(CreateDatasetError::OwnerNotFound(command.owner_id))?;

    let dataset_id: Uuid =
        sqlx::query_scalar("INSERT INTO datasets (user_id) VALUES ($1) RETURNING id")
            .bind(command.owner_id)
            .fetch_one(&mut *tx)
            .await?;

    let dataset_type = command
        .dataset_type
        .clone()
        .unwrap_or_else(|| hub_common::kinds::DEFAULT_KIND.to_string());

    let metadata_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO dataset_metadata
            (dataset_id, title, description, tags, data_category, dataset_type, dataset_doi)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(dataset_id)
    .bind(command.title.trim())
    .bind(command.description.trim())
    .bind(&command.tags)
    .bind(command.data_category.as_str())
    .bind(&dataset_type)
    .bind(&command.dataset_doi)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            CreateDatasetError::DuplicateDoi(command.dataset_doi.clone().unwrap_or_default())
        } else {
            CreateDatasetError::Database(e)
        }
    })?;

    let authors = if command.authors.is_empty() {
        vec![AuthorInput {
            name: owner_name,
            affiliation: None,
            orcid: None,
        }]
    } else {
        command.authors.clone()
    };
    insert_authors(&mut tx, AuthorOwner::Dataset(metadata_id), &authors).await?;

    for file in &command.files {
        let file_id: Uuid =
            sqlx::query_scalar("INSERT INTO dataset_files (dataset_id) VALUES ($1) RETURNING id")
                .bind(dataset_id)
                .fetch_one(&mut *tx)
                .await?;

        let file_metadata_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO file_metadata
                (dataset_file_id, filename, title, description, tags, publication_doi)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(file_id)
        .bind(&file.filename)
        .bind(file.title.as_deref().unwrap_or(&file.filename))
        .bind(&file.description)
        .bind(&file.tags)
        .bind(&file.publication_doi)
        .fetch_one(&mut *tx)
        .await?;

        insert_authors(&mut tx, AuthorOwner::File(file_metadata_id), &file.authors).await?;
    }

    tx.commit().await?;

    tracing::info!(dataset_id = %dataset_id, "Dataset created");

    crate::features::datasets::queries::get::load_detail(&pool, dataset_id)
        .await?
        .ok_or(CreateDatasetError::Database(sqlx::Error::RowNotFound))
}

enum AuthorOwner {
    Dataset(Uuid),
    File(Uuid),
}

async fn insert_authors(
    tx: &mut Transaction<'_, Postgres>,
    owner: AuthorOwner,
    authors: &[AuthorInput],
) -> Result<(), sqlx::Error> {
    let (dataset_metadata_id, file_metadata_id) = match owner {
        AuthorOwner::Dataset(id) => (Some(id), None),
        AuthorOwner::File(id) => (None, Some(id)),
    };

    for (position, author) in authors.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO authors (dataset_metadata_id, file_metadata_id, name, affiliation, orcid, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(dataset_metadata_id)
        .bind(file_metadata_id)
        .bind(author.name.trim())
        .bind(&author.affiliation)
        .bind(&author.orcid)
        .bind(position as i32)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
