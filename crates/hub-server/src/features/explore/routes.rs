//! Explore API routes
//!
//! - `GET /api/v1/explore?query=&tags=&...` - Filter datasets from query parameters
//! - `POST /api/v1/explore` - Same filter from a JSON body (list parameters may be arrays)

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;

use crate::api::response::{ApiResponse, ErrorResponse};

use super::{queries::ExploreError, types::ExploreQuery};

pub fn explore_routes() -> Router<PgPool> {
    Router::new().route("/", get(explore_get).post(explore_post))
}

async fn explore_get(
    State(pool): State<PgPool>,
    Query(query): Query<ExploreQuery>,
) -> Result<Response, ExploreError> {
    explore(pool, query).await
}

async fn explore_post(
    State(pool): State<PgPool>,
    Json(query): Json<ExploreQuery>,
) -> Result<Response, ExploreError> {
    explore(pool, query).await
}

async fn explore(pool: PgPool, query: ExploreQuery) -> Result<Response, ExploreError> {
    let filter = query.to_filter();
    let meta = json!({ "limit": filter.limit, "offset": filter.offset });

    let items = super::queries::filter::handle(pool, query).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success_with_meta(items, meta))).into_response())
}

impl IntoResponse for ExploreError {
    fn into_response(self) -> Response {
        match self {
            ExploreError::Database(_) => {
                tracing::error!("Database error during explore: {}", self);
                ErrorResponse::new("INTERNAL_ERROR", "A database error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
        }
    }
}
