//! Dataset API routes
//!
//! # Route Structure
//!
//! - `POST /api/v1/datasets` - Register a dataset (authenticated)
//! - `GET /api/v1/datasets/latest` - Latest synchronized datasets
//! - `GET /api/v1/datasets/:id` - Dataset detail, records a view
//! - `POST /api/v1/datasets/:id/downloads` - Record a download
//! - `GET /api/v1/datasets/:id/related` - Related datasets

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::related::{get_related_datasets, DEFAULT_RELATED_LIMIT};
use crate::features::FeatureState;
use crate::middleware::CurrentUser;

use super::{
    commands::{
        CreateDatasetCommand, CreateDatasetError, RecordActivityCommand, RecordActivityError,
        RecordActivityResponse,
    },
    queries::{
        GetDatasetError, GetDatasetQuery, LatestDatasetsError, LatestDatasetsQuery,
    },
};

pub fn datasets_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", post(create_dataset))
        .route("/latest", get(latest_datasets))
        .route("/:id", get(get_dataset))
        .route("/:id/downloads", post(record_download))
        .route("/:id/related", get(related_datasets))
}

#[tracing::instrument(skip(state, command), fields(user_id = %user.id()))]
async fn create_dataset(
    State(state): State<FeatureState>,
    user: CurrentUser,
    Json(mut command): Json<CreateDatasetCommand>,
) -> Result<Response, DatasetApiError> {
    command.owner_id = user.id();

    let detail = super::commands::create::handle(state.db, &state.kinds, command).await?;

    tracing::info!(dataset_id = %detail.id, "Dataset created via API");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(detail))).into_response())
}

#[tracing::instrument(skip(state, headers))]
async fn get_dataset(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, DatasetApiError> {
    let mut detail = super::queries::get::handle(state.db.clone(), GetDatasetQuery { id }).await?;

    let command = RecordActivityCommand::view(id, read_cookie(&headers, "view_cookie"));
    let cookie_name = command.kind.cookie_name();
    let recorded = super::commands::record::handle(state.db, command).await?;
    if recorded.recorded {
        detail.view_count += 1;
    }

    let mut response = (StatusCode::OK, Json(ApiResponse::success(detail))).into_response();
    set_cookie(&mut response, cookie_name, &recorded.cookie);
    Ok(response)
}

#[tracing::instrument(skip(state, headers))]
async fn record_download(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, DatasetApiError> {
    let command = RecordActivityCommand::download(id, read_cookie(&headers, "download_cookie"));
    let cookie_name = command.kind.cookie_name();
    let recorded: RecordActivityResponse = super::commands::record::handle(state.db, command).await?;

    let mut response = (StatusCode::OK, Json(ApiResponse::success(&recorded))).into_response();
    set_cookie(&mut response, cookie_name, &recorded.cookie);
    Ok(response)
}

#[tracing::instrument(skip(state))]
async fn latest_datasets(
    State(state): State<FeatureState>,
    Query(query): Query<LatestDatasetsQuery>,
) -> Result<Response, DatasetApiError> {
    let items = super::queries::latest::handle(state.db, query).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(items))).into_response())
}

#[derive(Debug, Deserialize)]
struct RelatedParams {
    limit: Option<i64>,
}

#[tracing::instrument(skip(state))]
async fn related_datasets(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
    Query(params): Query<RelatedParams>,
) -> Result<Response, DatasetApiError> {
    let detail = super::queries::get::handle(state.db.clone(), GetDatasetQuery { id }).await?;
    let limit = params.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_RELATED_LIMIT);

    let items = get_related_datasets(&state.db, Some(&detail), Some(limit))
        .await
        .map_err(GetDatasetError::Database)?;

    Ok((StatusCode::OK, Json(ApiResponse::success(items))).into_response())
}

/// Value of the `name` cookie from the request's Cookie headers
pub(crate) fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
}

fn set_cookie(response: &mut Response, name: &str, value: &str) {
    let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", name, value);
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        },
        Err(e) => tracing::warn!(error = %e, "Cookie value is not a valid header"),
    }
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum DatasetApiError {
    #[error(transparent)]
    Create(#[from] CreateDatasetError),
    #[error(transparent)]
    Get(#[from] GetDatasetError),
    #[error(transparent)]
    Latest(#[from] LatestDatasetsError),
    #[error(transparent)]
    Record(#[from] RecordActivityError),
}

impl IntoResponse for DatasetApiError {
    fn into_response(self) -> Response {
        match self {
            DatasetApiError::Create(
                CreateDatasetError::Title(_)
                | CreateDatasetError::DescriptionRequired
                | CreateDatasetError::AuthorNameRequired
                | CreateDatasetError::TooManyFiles
                | CreateDatasetError::InvalidFilename(_)
                | CreateDatasetError::UnknownDatasetType(_),
            ) => ErrorResponse::new("VALIDATION_ERROR", self.to_string())
                .into_response_with(StatusCode::BAD_REQUEST),
            DatasetApiError::Create(CreateDatasetError::DuplicateDoi(_)) => {
                ErrorResponse::new("CONFLICT", self.to_string())
                    .into_response_with(StatusCode::CONFLICT)
            },
            DatasetApiError::Create(CreateDatasetError::OwnerNotFound(_)) => {
                ErrorResponse::new("UNAUTHORIZED", self.to_string())
                    .into_response_with(StatusCode::UNAUTHORIZED)
            },
            DatasetApiError::Get(GetDatasetError::NotFound(_))
            | DatasetApiError::Record(RecordActivityError::NotFound(_)) => {
                ErrorResponse::new("NOT_FOUND", self.to_string())
                    .into_response_with(StatusCode::NOT_FOUND)
            },
            DatasetApiError::Create(CreateDatasetError::Database(_))
            | DatasetApiError::Get(GetDatasetError::Database(_))
            | DatasetApiError::Latest(LatestDatasetsError::Database(_))
            | DatasetApiError::Record(RecordActivityError::Database(_)) => {
                tracing::error!("Database error in dataset endpoint: {}", self);
                ErrorResponse::new("INTERNAL_ERROR", "A database error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; view_cookie=abc-123 ; other=1"),
        );
        assert_eq!(read_cookie(&headers, "view_cookie").as_deref(), Some("abc-123"));
        assert_eq!(read_cookie(&headers, "download_cookie"), None);
    }

    #[test]
    fn test_set_cookie() {
        let mut response = StatusCode::OK.into_response();
        set_cookie(&mut response, "download_cookie", "abc");
        let value = response.headers().get(header::SET_COOKIE).unwrap();
        assert_eq!(value, "download_cookie=abc; Path=/; HttpOnly; SameSite=Lax");
    }

    #[test]
    fn test_error_status_codes() {
        let not_found = DatasetApiError::Get(GetDatasetError::NotFound(Uuid::nil())).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid =
            DatasetApiError::Create(CreateDatasetError::TooManyFiles).into_response();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let conflict =
            DatasetApiError::Create(CreateDatasetError::DuplicateDoi("10.1/x".to_string()))
                .into_response();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
    }
}
