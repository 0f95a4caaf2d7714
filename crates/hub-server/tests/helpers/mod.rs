//! Test helpers for hub server integration tests
//!
//! Builds the full router over a test database, with a MinIO-style storage
//! client that is never contacted and a logging notifier.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use hub_common::kinds::KindRegistry;
use hub_server::{
    api,
    config::Config,
    features::FeatureState,
    middleware::USER_ID_HEADER,
    notify::LogNotifier,
    storage::{config::StorageConfig, Storage},
};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
}

/// A response with its status, headers and parsed JSON body
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn new(pool: PgPool) -> Self {
        let storage = Storage::new(StorageConfig::for_minio("http://127.0.0.1:9", "hub-test"))
            .await
            .expect("storage client");

        let state = FeatureState {
            db: pool.clone(),
            storage,
            notifier: Arc::new(LogNotifier),
            kinds: Arc::new(KindRegistry::default()),
        };

        Self {
            router: api::create_router(state, &Config::default()),
            pool,
        }
    }

    pub async fn insert_user(&self, email: &str) -> Uuid {
        sqlx::query_scalar("INSERT INTO users (email) VALUES ($1) RETURNING id")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .expect("insert user")
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            },
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, user: Option<Uuid>) -> TestResponse {
        self.request("GET", uri, user, None).await
    }

    pub async fn post(&self, uri: &str, user: Option<Uuid>, body: Value) -> TestResponse {
        self.request("POST", uri, user, Some(body)).await
    }
}

/// `data.id` of a success envelope
pub fn data_id(response: &TestResponse) -> Uuid {
    response.body["data"]["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("response carries data.id")
}
