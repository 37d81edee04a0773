//! HTTP surface of the mirror server.
//!
//! Three route families share one [`AppState`]: the webhook receiver, the
//! sync triggers, and the thin host mutations. Responses are JSON; errors
//! carry `{"error": message}` with a status derived from the library's
//! error taxonomy.
//!
//! Sync and mutation endpoints authenticate against the host with the
//! caller's own token, taken from the `Authorization: Bearer` header on
//! each request. The server never stores tokens.

mod mutate;
mod sync;
mod webhook;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use sea_orm::DatabaseConnection;
use serde_json::json;

use forgemirror::github::{GitHubClient, HostError};
use forgemirror::store::StoreError;
use forgemirror::sync::SyncError;
use forgemirror::webhook::IngestError;

use crate::config::Config;
use crate::tasks::TaskPool;

/// Shared state behind every route.
///
/// The connection is held behind an `Arc` because `DatabaseConnection` is
/// not `Clone` when sea-orm's `mock` feature is active (as it is in test
/// builds).
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) db: Arc<DatabaseConnection>,
    pub(crate) config: Arc<Config>,
    pub(crate) tasks: TaskPool,
}

/// Assemble the full router.
pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .merge(webhook::router())
        .merge(sync::router())
        .merge(mutate::router())
        .with_state(state)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// Error response: a status code plus `{"error": message}`.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("request failed: {}", self.message);
        }
        (self.status, Json(json!({"error": self.message}))).into_response()
    }
}

fn host_status(err: &HostError) -> StatusCode {
    match err {
        HostError::Auth => StatusCode::UNAUTHORIZED,
        HostError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        HostError::NotFound { .. } => StatusCode::NOT_FOUND,
        HostError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        HostError::Transient { .. } | HostError::Unknown { .. } => StatusCode::BAD_GATEWAY,
    }
}

impl From<HostError> for ApiError {
    fn from(err: HostError) -> Self {
        Self {
            status: host_status(&err),
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Store(store) => store.into(),
            SyncError::Host { ref source, .. } => Self {
                status: host_status(source),
                message: err.to_string(),
            },
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        let status = match &err {
            IngestError::Signature(_) => StatusCode::UNAUTHORIZED,
            IngestError::UnsupportedEvent { .. } | IngestError::MalformedPayload { .. } => {
                StatusCode::BAD_REQUEST
            }
            IngestError::Store(StoreError::InvalidInput { .. }) => StatusCode::BAD_REQUEST,
            IngestError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// The caller's host token from the `Authorization: Bearer` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("missing Authorization header"))?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Authorization header is not a bearer token"))
}

/// Build a per-request GitHub client from the caller's bearer token.
pub(crate) fn client_from(state: &AppState, headers: &HeaderMap) -> Result<GitHubClient, ApiError> {
    let token = bearer_token(headers)?;
    state.config.build_client(token).map_err(ApiError::from)
}

/// Split `owner/name` into its parts.
pub(crate) fn split_repository(full: &str) -> Option<(&str, &str)> {
    match full.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Some((owner, name))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::Request;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tower::ServiceExt;

    pub(crate) fn test_state(db: DatabaseConnection) -> AppState {
        AppState {
            db: Arc::new(db),
            config: Arc::new(Config::default()),
            tasks: TaskPool::new(),
        }
    }

    pub(crate) fn empty_state() -> AppState {
        test_state(MockDatabase::new(DatabaseBackend::Sqlite).into_connection())
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let app = build_router(empty_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = build_router(empty_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_errors_map_to_expected_statuses() {
        assert_eq!(
            ApiError::from(StoreError::not_found_by_key("repository", "acme/api")).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(StoreError::invalid_input("bad page size")).status,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn host_errors_map_to_expected_statuses() {
        assert_eq!(
            ApiError::from(HostError::Auth).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(HostError::RateLimited {
                reset_at: None,
                retry_after: Some(30),
            })
            .status,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::from(HostError::NotFound {
                resource: "acme/api".to_string(),
            })
            .status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(HostError::Unprocessable {
                message: "not mergeable".to_string(),
            })
            .status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(HostError::Transient {
                message: "connection reset".to_string(),
            })
            .status,
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn sync_host_error_keeps_the_unit_in_the_message() {
        let err = SyncError::Host {
            unit: "pull_request/user-1/acme/api".to_string(),
            source: HostError::Auth,
        };
        let api: ApiError = err.into();
        assert_eq!(api.status, StatusCode::UNAUTHORIZED);
        assert!(api.message.contains("pull_request/user-1/acme/api"));
    }

    #[test]
    fn bearer_token_requires_the_scheme() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, "token ghp_x".parse().unwrap());
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, "Bearer ghp_x".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "ghp_x");
    }

    #[test]
    fn split_repository_rejects_malformed_names() {
        assert_eq!(split_repository("acme/api"), Some(("acme", "api")));
        assert_eq!(split_repository("acme"), None);
        assert_eq!(split_repository("/api"), None);
        assert_eq!(split_repository("acme/"), None);
        assert_eq!(split_repository("acme/api/extra"), None);
    }
}
