//! Community API routes
//!
//! # Route Structure
//!
//! - `GET /api/v1/communities` - List communities, newest first
//! - `POST /api/v1/communities` - Create a community (authenticated)
//! - `GET /api/v1/communities/mine` - Communities the caller manages
//! - `GET /api/v1/communities/:id` - Community detail; the responsible user
//!   also sees pending and accepted proposals
//! - `PUT /api/v1/communities/:id/icon` - Upload the icon (multipart field `icon`)
//! - `GET /api/v1/communities/:id/icon` - Icon bytes

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::FeatureState;
use crate::middleware::CurrentUser;

use super::{
    commands::{CreateCommunityCommand, CreateCommunityError, SetIconCommand, SetIconError},
    queries::{
        GetCommunityError, GetCommunityQuery, GetIconError, ListCommunitiesError,
        ListCommunitiesQuery,
    },
    types::MAX_ICON_BYTES,
};

/// Request body ceiling for icon uploads, leaving room for multipart framing
const ICON_BODY_LIMIT: usize = MAX_ICON_BYTES + 64 * 1024;

pub fn communities_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_communities).post(create_community))
        .route("/mine", get(my_communities))
        .route("/:id", get(get_community))
        .route(
            "/:id/icon",
            put(upload_icon)
                .layer(DefaultBodyLimit::max(ICON_BODY_LIMIT))
                .get(download_icon),
        )
}

#[tracing::instrument(skip(state))]
async fn list_communities(State(state): State<FeatureState>) -> Result<Response, CommunityApiError> {
    let communities = super::queries::list::handle(state.db, ListCommunitiesQuery::all()).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(communities))).into_response())
}

#[tracing::instrument(skip(state), fields(user_id = %user.id()))]
async fn my_communities(
    State(state): State<FeatureState>,
    user: CurrentUser,
) -> Result<Response, CommunityApiError> {
    let communities =
        super::queries::list::handle(state.db, ListCommunitiesQuery::managed_by(user.id())).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(communities))).into_response())
}

#[tracing::instrument(skip(state, command), fields(user_id = %user.id()))]
async fn create_community(
    State(state): State<FeatureState>,
    user: CurrentUser,
    Json(mut command): Json<CreateCommunityCommand>,
) -> Result<Response, CommunityApiError> {
    command.responsible_user_id = user.id();

    let community = super::commands::create::handle(state.db, command).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(community))).into_response())
}

#[tracing::instrument(skip(state, user))]
async fn get_community(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
    user: Option<CurrentUser>,
) -> Result<Response, CommunityApiError> {
    let query = GetCommunityQuery {
        id,
        viewer: user.map(|u| u.id()),
    };
    let view = super::queries::get::handle(state.db, query).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(view))).into_response())
}

#[tracing::instrument(skip(state, multipart), fields(user_id = %user.id()))]
async fn upload_icon(
    State(state): State<FeatureState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Response, CommunityApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CommunityApiError::Multipart(e.to_string()))?
    {
        if !matches!(field.name(), Some("icon") | Some("file")) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                CommunityApiError::SetIcon(SetIconError::TooLarge)
            } else {
                CommunityApiError::Multipart(e.to_string())
            }
        })?;
        upload = Some((filename, data.to_vec()));
    }

    let (filename, content) = upload.unwrap_or_default();
    let command = SetIconCommand {
        community_id: id,
        user_id: user.id(),
        filename,
        content,
    };

    let community = super::commands::set_icon::handle(state.db, state.storage, command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(community))).into_response())
}

#[tracing::instrument(skip(state))]
async fn download_icon(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
) -> Result<Response, CommunityApiError> {
    let object = super::queries::icon::handle(state.db, state.storage, id).await?;
    let content_type = object
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, content_type)], object.data).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum CommunityApiError {
    #[error("Failed to read multipart upload: {0}")]
    Multipart(String),
    #[error(transparent)]
    Create(#[from] CreateCommunityError),
    #[error(transparent)]
    SetIcon(#[from] SetIconError),
    #[error(transparent)]
    Get(#[from] GetCommunityError),
    #[error(transparent)]
    Icon(#[from] GetIconError),
    #[error(transparent)]
    List(#[from] ListCommunitiesError),
}

impl IntoResponse for CommunityApiError {
    fn into_response(self) -> Response {
        match self {
            CommunityApiError::Multipart(_)
            | CommunityApiError::Create(
                CreateCommunityError::Name(_) | CreateCommunityError::Description(_),
            )
            | CommunityApiError::SetIcon(
                SetIconError::Required | SetIconError::InvalidFormat | SetIconError::Corrupt,
            ) => ErrorResponse::new("VALIDATION_ERROR", self.to_string())
                .into_response_with(StatusCode::BAD_REQUEST),
            CommunityApiError::SetIcon(SetIconError::TooLarge) => {
                ErrorResponse::new("PAYLOAD_TOO_LARGE", self.to_string())
                    .into_response_with(StatusCode::PAYLOAD_TOO_LARGE)
            },
            CommunityApiError::Create(CreateCommunityError::ResponsibleNotFound(_)) => {
                ErrorResponse::new("UNAUTHORIZED", self.to_string())
                    .into_response_with(StatusCode::UNAUTHORIZED)
            },
            CommunityApiError::SetIcon(SetIconError::Forbidden) => {
                ErrorResponse::new("FORBIDDEN", self.to_string())
                    .into_response_with(StatusCode::FORBIDDEN)
            },
            CommunityApiError::SetIcon(SetIconError::NotFound(_))
            | CommunityApiError::Get(GetCommunityError::NotFound(_))
            | CommunityApiError::Icon(GetIconError::NotFound(_)) => {
                ErrorResponse::new("NOT_FOUND", self.to_string())
                    .into_response_with(StatusCode::NOT_FOUND)
            },
            CommunityApiError::SetIcon(SetIconError::Storage(_))
            | CommunityApiError::Icon(GetIconError::Storage(_)) => {
                tracing::error!("Storage error in community endpoint: {}", self);
                ErrorResponse::new("STORAGE_ERROR", "A storage error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
            CommunityApiError::Create(CreateCommunityError::Database(_))
            | CommunityApiError::SetIcon(SetIconError::Database(_))
            | CommunityApiError::Get(GetCommunityError::Database(_))
            | CommunityApiError::Icon(GetIconError::Database(_))
            | CommunityApiError::List(ListCommunitiesError::Database(_)) => {
                tracing::error!("Database error in community endpoint: {}", self);
                ErrorResponse::new("INTERNAL_ERROR", "A database error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::NameValidationError;

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (
                CommunityApiError::Create(CreateCommunityError::Name(NameValidationError::Required)),
                StatusCode::BAD_REQUEST,
            ),
            (CommunityApiError::SetIcon(SetIconError::TooLarge), StatusCode::PAYLOAD_TOO_LARGE),
            (CommunityApiError::SetIcon(SetIconError::Forbidden), StatusCode::FORBIDDEN),
            (
                CommunityApiError::Icon(GetIconError::NotFound(Uuid::nil())),
                StatusCode::NOT_FOUND,
            ),
            (
                CommunityApiError::Icon(GetIconError::Storage(anyhow::anyhow!("boom"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
