//! Write-through mutation routes.
//!
//! Each endpoint validates its body, forwards exactly one call to the host
//! under the caller's bearer token, and kicks a background re-sync of the
//! affected resource. The mirror row is never edited directly; it converges
//! once the re-sync or the corresponding webhook lands, so a host rejection
//! leaves the mirror untouched.

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::post;
use serde::Deserialize;
use serde_json::{Value, json};

use forgemirror::github::{GitHubClient, HostApi, MergeRequest, ReviewSubmission};
use forgemirror::store::find_pull_request;
use forgemirror::sync::{
    SyncOptions, sync_issues, sync_pull_request_detail, sync_reviews,
};

use super::{ApiError, AppState, client_from};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{user}/repos/{owner}/{name}/pulls/{number}/merge",
            post(merge),
        )
        .route(
            "/users/{user}/repos/{owner}/{name}/pulls/{number}/reviews",
            post(submit_review),
        )
        .route(
            "/users/{user}/repos/{owner}/{name}/pulls/{number}/reviewers",
            post(request_reviewers),
        )
        .route(
            "/users/{user}/repos/{owner}/{name}/pulls/{number}/lock",
            post(set_locked),
        )
        .route(
            "/users/{user}/repos/{owner}/{name}/issues/{number}/labels",
            post(change_labels),
        )
}

#[derive(Debug, Deserialize)]
struct ReviewersBody {
    reviewers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LockBody {
    locked: bool,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LabelsBody {
    #[serde(default)]
    add: Vec<String>,
    #[serde(default)]
    remove: Vec<String>,
}

async fn merge(
    State(state): State<AppState>,
    Path((user, owner, name, number)): Path<(String, String, String, i32)>,
    headers: HeaderMap,
    Json(request): Json<MergeRequest>,
) -> Result<Json<Value>, ApiError> {
    let client = client_from(&state, &headers)?;
    let outcome = client
        .merge_pull_request(&owner, &name, number, &request)
        .await?;
    resync_pull(&state, client, user, owner, name, number);
    Ok(Json(json!({
        "merged": outcome.merged,
        "sha": outcome.sha,
        "message": outcome.message,
    })))
}

async fn submit_review(
    State(state): State<AppState>,
    Path((user, owner, name, number)): Path<(String, String, String, i32)>,
    headers: HeaderMap,
    Json(submission): Json<ReviewSubmission>,
) -> Result<Json<Value>, ApiError> {
    let client = client_from(&state, &headers)?;
    let review = client
        .submit_review(&owner, &name, number, &submission)
        .await?;

    let db = state.db.clone();
    let label = format!("review re-sync for {user} {owner}/{name}#{number}");
    state.tasks.spawn(&label, async move {
        let options = SyncOptions::default();
        let on_progress = crate::progress::logging_callback();
        if let Err(err) = sync_reviews(
            &db,
            &client,
            &user,
            &owner,
            &name,
            number,
            &options,
            Some(&on_progress),
        )
        .await
        {
            tracing::warn!("review re-sync after submit failed: {err}");
        }
    });

    Ok(Json(json!({
        "id": review.id,
        "state": review.state,
    })))
}

async fn request_reviewers(
    State(state): State<AppState>,
    Path((user, owner, name, number)): Path<(String, String, String, i32)>,
    headers: HeaderMap,
    Json(body): Json<ReviewersBody>,
) -> Result<Json<Value>, ApiError> {
    if body.reviewers.is_empty() {
        return Err(ApiError::bad_request("no reviewers named"));
    }
    let client = client_from(&state, &headers)?;
    client
        .request_reviewers(&owner, &name, number, &body.reviewers)
        .await?;
    resync_pull(&state, client, user, owner, name, number);
    Ok(Json(json!({"requested": true})))
}

async fn set_locked(
    State(state): State<AppState>,
    Path((user, owner, name, number)): Path<(String, String, String, i32)>,
    headers: HeaderMap,
    Json(body): Json<LockBody>,
) -> Result<Json<Value>, ApiError> {
    let client = client_from(&state, &headers)?;
    client
        .set_locked(&owner, &name, number, body.locked, body.reason.as_deref())
        .await?;
    resync_pull(&state, client, user, owner, name, number);
    Ok(Json(json!({"locked": body.locked})))
}

async fn change_labels(
    State(state): State<AppState>,
    Path((user, owner, name, number)): Path<(String, String, String, i32)>,
    headers: HeaderMap,
    Json(body): Json<LabelsBody>,
) -> Result<Json<Value>, ApiError> {
    if body.add.is_empty() && body.remove.is_empty() {
        return Err(ApiError::bad_request(
            "nothing to change: both add and remove are empty",
        ));
    }
    let client = client_from(&state, &headers)?;

    let mut labels: Vec<String> = Vec::new();
    if !body.add.is_empty() {
        labels = client
            .add_labels(&owner, &name, number, &body.add)
            .await?
            .into_iter()
            .map(|label| label.name)
            .collect();
    }
    for label in &body.remove {
        labels = client
            .remove_label(&owner, &name, number, label)
            .await?
            .into_iter()
            .map(|label| label.name)
            .collect();
    }

    // Labels apply to issues and pull requests alike; pick the re-sync that
    // matches whichever the mirror holds under this number.
    if find_pull_request(&state.db, &user, &owner, &name, number)
        .await?
        .is_some()
    {
        resync_pull(&state, client, user, owner, name, number);
    } else {
        let db = state.db.clone();
        let label = format!("issue re-sync for {user} {owner}/{name}");
        state.tasks.spawn(&label, async move {
            let options = SyncOptions::default();
            let on_progress = crate::progress::logging_callback();
            if let Err(err) = sync_issues(
                &db,
                &client,
                &user,
                &owner,
                &name,
                &options,
                Some(&on_progress),
            )
            .await
            {
                tracing::warn!("issue re-sync after label change failed: {err}");
            }
        });
    }

    Ok(Json(json!({"labels": labels})))
}

fn resync_pull(
    state: &AppState,
    client: GitHubClient,
    user: String,
    owner: String,
    name: String,
    number: i32,
) {
    let db = state.db.clone();
    let label = format!("detail re-sync for {user} {owner}/{name}#{number}");
    state.tasks.spawn(&label, async move {
        let options = SyncOptions::default();
        let on_progress = crate::progress::logging_callback();
        if let Err(err) = sync_pull_request_detail(
            &db,
            &client,
            &user,
            &owner,
            &name,
            number,
            &options,
            Some(&on_progress),
        )
        .await
        {
            tracing::warn!("detail re-sync after mutation failed: {err}");
        }
    });
}
