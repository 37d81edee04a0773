//! Sync trigger and inspection routes.
//!
//! Each trigger runs one collection inline under the caller's bearer token
//! and reports the outcome, including the host's rate-limit snapshot when
//! one was observed. The full-sync trigger is the exception: it answers
//! 202 immediately and runs in the background, since a cold account can
//! take minutes.

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Value, json};

use forgemirror::github::GitHubClient;
use forgemirror::sync::{
    FullSyncOptions, FullSyncOutcome, SyncOptions, SyncOutcome, full_sync, list_sync_states,
    sync_check_runs, sync_issues, sync_pull_request_detail, sync_pull_requests, sync_repositories,
};

use super::{ApiError, AppState, client_from, split_repository};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user}/sync", get(list_states))
        .route("/users/{user}/sync/repositories", post(trigger_repositories))
        .route("/users/{user}/sync/pulls", post(trigger_pulls))
        .route("/users/{user}/sync/pull", post(trigger_pull_detail))
        .route("/users/{user}/sync/issues", post(trigger_issues))
        .route("/users/{user}/sync/checks", post(trigger_checks))
        .route("/users/{user}/sync/full", post(trigger_full))
}

#[derive(Debug, Deserialize)]
struct RepoScope {
    repository: String,
}

#[derive(Debug, Deserialize)]
struct PullScope {
    repository: String,
    number: i32,
}

#[derive(Debug, Deserialize)]
struct ChecksScope {
    repository: String,
    #[serde(rename = "ref")]
    git_ref: String,
}

async fn list_states(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let rows = list_sync_states(&state.db, &user).await?;
    Ok(Json(json!({"states": rows})))
}

async fn trigger_repositories(
    State(state): State<AppState>,
    Path(user): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let client = client_from(&state, &headers)?;
    let options = SyncOptions::default();
    let on_progress = crate::progress::logging_callback();
    let outcome =
        sync_repositories(&state.db, &client, &user, &options, Some(&on_progress)).await?;
    Ok(outcome_body(outcome, &client))
}

async fn trigger_pulls(
    State(state): State<AppState>,
    Path(user): Path<String>,
    headers: HeaderMap,
    Json(scope): Json<RepoScope>,
) -> Result<Json<Value>, ApiError> {
    let (owner, name) = repo_parts(&scope.repository)?;
    let client = client_from(&state, &headers)?;
    let options = SyncOptions::default();
    let on_progress = crate::progress::logging_callback();
    let outcome = sync_pull_requests(
        &state.db,
        &client,
        &user,
        owner,
        name,
        &options,
        Some(&on_progress),
    )
    .await?;
    Ok(outcome_body(outcome, &client))
}

async fn trigger_pull_detail(
    State(state): State<AppState>,
    Path(user): Path<String>,
    headers: HeaderMap,
    Json(scope): Json<PullScope>,
) -> Result<Json<Value>, ApiError> {
    let (owner, name) = repo_parts(&scope.repository)?;
    let client = client_from(&state, &headers)?;
    let options = SyncOptions::default();
    let on_progress = crate::progress::logging_callback();
    let outcome = sync_pull_request_detail(
        &state.db,
        &client,
        &user,
        owner,
        name,
        scope.number,
        &options,
        Some(&on_progress),
    )
    .await?;
    Ok(outcome_body(outcome, &client))
}

async fn trigger_issues(
    State(state): State<AppState>,
    Path(user): Path<String>,
    headers: HeaderMap,
    Json(scope): Json<RepoScope>,
) -> Result<Json<Value>, ApiError> {
    let (owner, name) = repo_parts(&scope.repository)?;
    let client = client_from(&state, &headers)?;
    let options = SyncOptions::default();
    let on_progress = crate::progress::logging_callback();
    let outcome = sync_issues(
        &state.db,
        &client,
        &user,
        owner,
        name,
        &options,
        Some(&on_progress),
    )
    .await?;
    Ok(outcome_body(outcome, &client))
}

async fn trigger_checks(
    State(state): State<AppState>,
    Path(user): Path<String>,
    headers: HeaderMap,
    Json(scope): Json<ChecksScope>,
) -> Result<Json<Value>, ApiError> {
    let (owner, name) = repo_parts(&scope.repository)?;
    let client = client_from(&state, &headers)?;
    let options = SyncOptions::default();
    let on_progress = crate::progress::logging_callback();
    let outcome = sync_check_runs(
        &state.db,
        &client,
        &user,
        owner,
        name,
        &scope.git_ref,
        &options,
        Some(&on_progress),
    )
    .await?;
    Ok(outcome_body(outcome, &client))
}

async fn trigger_full(
    State(state): State<AppState>,
    Path(user): Path<String>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let client = client_from(&state, &headers)?;
    let options = FullSyncOptions {
        sync: SyncOptions::default(),
        webhook: state.config.webhook_registration(),
    };
    let db = state.db.clone();
    let task_user = user.clone();
    state.tasks.spawn(&format!("full sync for {user}"), async move {
        let on_progress = crate::progress::logging_callback();
        match full_sync(&db, &client, &task_user, &options, Some(&on_progress)).await {
            Ok(FullSyncOutcome::Finished(result)) => {
                if let Some(phase) = &result.aborted {
                    tracing::warn!("full sync for {task_user} aborted during {phase}");
                } else if result.is_clean() {
                    tracing::info!("full sync for {task_user} finished");
                } else {
                    tracing::warn!(
                        "full sync for {task_user} finished with {} failed units",
                        result.total_failed()
                    );
                }
            }
            Ok(FullSyncOutcome::AlreadyRunning) => {
                tracing::info!("full sync for {task_user} already in progress");
            }
            Ok(FullSyncOutcome::CredentialBlocked) => {
                tracing::warn!("full sync for {task_user} blocked: credential marked invalid");
            }
            Err(err) => {
                tracing::error!("full sync for {task_user} failed: {err}");
            }
        }
    });

    Ok((StatusCode::ACCEPTED, Json(json!({"started": true}))))
}

fn repo_parts(full: &str) -> Result<(&str, &str), ApiError> {
    split_repository(full)
        .ok_or_else(|| ApiError::bad_request(format!("repository must be owner/name, got {full:?}")))
}

fn outcome_body(outcome: SyncOutcome, client: &GitHubClient) -> Json<Value> {
    let rate_limit = client.last_rate_limit().map(|snapshot| {
        json!({
            "limit": snapshot.limit,
            "remaining": snapshot.remaining,
            "reset_at": snapshot.reset_at,
            "retry_after": snapshot.retry_after,
        })
    });
    match outcome {
        SyncOutcome::Completed(stats) => Json(json!({
            "outcome": "completed",
            "pages": stats.pages,
            "upserted": stats.upserted,
            "skipped": stats.skipped,
            "not_modified": stats.not_modified,
            "errors": stats.errors,
            "rate_limit": rate_limit,
        })),
        SyncOutcome::AlreadyRunning => Json(json!({
            "outcome": "already_running",
            "rate_limit": rate_limit,
        })),
        SyncOutcome::CredentialBlocked => Json(json!({
            "outcome": "credential_blocked",
            "rate_limit": rate_limit,
        })),
    }
}
