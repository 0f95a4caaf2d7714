//! Authenticated principal
//!
//! The gateway in front of the hub authenticates users and forwards the
//! principal as a UUID in the `x-user-id` header. Handlers that need a user
//! take a [`CurrentUser`]; handlers where a user is optional take
//! `Option<CurrentUser>`.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user making the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        let id = value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .ok_or_else(|| AppError::Unauthorized("Malformed x-user-id header".to_string()))?;

        Ok(CurrentUser(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;

    async fn extract(header: Option<&str>) -> Result<CurrentUser, AppError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        CurrentUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_header() {
        let id = Uuid::new_v4();
        let user = extract(Some(&id.to_string())).await.unwrap();
        assert_eq!(user.id(), id);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let err = extract(None).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_header_is_unauthorized() {
        let err = extract(Some("not-a-uuid")).await.unwrap_err();
        assert!(err.to_string().contains("Malformed"));
    }
}
