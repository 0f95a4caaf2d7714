//! HTTP surface: router assembly and the server loop

pub mod response;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::error::AppResult;
use crate::features::{self, datasets::queries::stats::PlatformStatsQuery, FeatureState};
use crate::middleware;

use self::response::{ApiResponse, ErrorResponse};

/// Create the application router with all routes and middleware
pub fn create_router(state: FeatureState, config: &Config) -> Router {
    let pool = state.db.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .with_state(pool)
        .nest("/api/v1", features::router(state))
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Bind the configured address and serve until a shutdown signal arrives.
pub async fn serve(config: Config, state: FeatureState) -> anyhow::Result<()> {
    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

async fn health_check(State(pool): State<PgPool>) -> Response {
    match db::health_check(&pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            ErrorResponse::new("UNAVAILABLE", "Database unavailable")
                .into_response_with(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}

async fn get_stats(State(pool): State<PgPool>) -> AppResult<Response> {
    let stats = features::datasets::queries::stats::handle(pool, PlatformStatsQuery)
        .await
        .map_err(|e| match e {
            features::datasets::queries::stats::PlatformStatsError::Database(e) => {
                crate::error::AppError::Database(e)
            },
        })?;

    Ok((StatusCode::OK, Json(ApiResponse::success(stats))).into_response())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
