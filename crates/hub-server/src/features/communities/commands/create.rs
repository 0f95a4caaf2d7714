//! Create a community

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::communities::types::{
    Community, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH,
};
use crate::features::shared::error_helpers::map_foreign_key_violation;
use crate::features::shared::validation::{
    validate_name, validate_required_text, NameValidationError, TextValidationError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommunityCommand {
    pub name: String,
    pub description: String,
    #[serde(skip)]
    pub responsible_user_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateCommunityError {
    #[error("Community name: {0}")]
    Name(#[from] NameValidationError),
    #[error("Community description: {0}")]
    Description(#[from] TextValidationError),
    #[error("User '{0}' not found")]
    ResponsibleNotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Community, CreateCommunityError>> for CreateCommunityCommand {}

impl crate::cqrs::middleware::Command for CreateCommunityCommand {}

impl CreateCommunityCommand {
    pub fn validate(&self) -> Result<(), CreateCommunityError> {
        validate_name(&self.name, MAX_NAME_LENGTH)?;
        validate_required_text(&self.description, MAX_DESCRIPTION_LENGTH)?;
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(responsible_user_id = %command.responsible_user_id))]
pub async fn handle(
    pool: PgPool,
    command: CreateCommunityCommand,
) -> Result<Community, CreateCommunityError> {
    command.validate()?;

    let community = sqlx::query_as::<_, Community>(
        r#"
        INSERT INTO communities (name, description, responsible_user_id)
        VALUES ($1, $2, $3)
        RETURNING id, name::text AS name, description::text AS description,
                  icon_key::text AS icon_key, responsible_user_id, created_at
        "#,
    )
    .bind(command.name.trim())
    .bind(command.description.trim())
    .bind(command.responsible_user_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        map_foreign_key_violation(
            e,
            CreateCommunityError::ResponsibleNotFound(command.responsible_user_id),
            CreateCommunityError::Database,
        )
    })?;

    tracing::info!(community_id = %community.id, name = %community.name, "Community created");

    Ok(community)
}
