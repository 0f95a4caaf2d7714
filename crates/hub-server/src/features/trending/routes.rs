//! Trending API routes
//!
//! - `GET /api/v1/trending?by=views|downloads&period=week|month&limit=N`

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use sqlx::PgPool;

use crate::api::response::ApiResponse;

use super::{queries::TrendingQuery, types::TrendingResponse};

pub fn trending_routes() -> Router<PgPool> {
    Router::new().route("/", get(trending))
}

async fn trending(
    State(pool): State<PgPool>,
    Query(query): Query<TrendingQuery>,
) -> ApiResponse<TrendingResponse> {
    ApiResponse::success(super::queries::rank::handle(pool, query).await)
}
