//! Typed lookups over the mirrored tables.
//!
//! Every read is scoped by tenant, either through an explicit `user_id`
//! filter or through a deterministic ID that already encodes the user.

use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::prelude::{
    CheckRun, CheckRunColumn, CheckRunModel, Comment, CommentColumn, CommentModel, Issue,
    IssueModel, PullRequest, PullRequestColumn, PullRequestModel, Repository, RepositoryColumn,
    RepositoryModel, Review, ReviewColumn, ReviewModel,
};
use crate::ident;

use super::errors::{Result, StoreError};

// ─── Repositories ────────────────────────────────────────────────────────────

/// Find a repository by its natural key.
pub async fn find_repository(
    db: &DatabaseConnection,
    user_id: &str,
    owner: &str,
    name: &str,
) -> Result<Option<RepositoryModel>> {
    let id = ident::repository_id(user_id, owner, name);
    Repository::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Find a repository by the host's numeric ID.
///
/// Returns the most recently synced match; a rename on the host can briefly
/// leave two rows sharing a remote ID.
pub async fn find_repository_by_remote_id(
    db: &DatabaseConnection,
    user_id: &str,
    remote_id: i64,
) -> Result<Option<RepositoryModel>> {
    Repository::find()
        .filter(RepositoryColumn::UserId.eq(user_id))
        .filter(RepositoryColumn::RemoteId.eq(remote_id))
        .order_by_desc(RepositoryColumn::SyncedAt)
        .one(db)
        .await
        .map_err(Into::into)
}

/// All repositories mirrored for one user, ordered by full name.
pub async fn list_repositories(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<RepositoryModel>> {
    Repository::find()
        .filter(RepositoryColumn::UserId.eq(user_id))
        .order_by_asc(RepositoryColumn::Owner)
        .order_by_asc(RepositoryColumn::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

// ─── Pull requests ───────────────────────────────────────────────────────────

/// Find a pull request by its natural key.
pub async fn find_pull_request(
    db: &DatabaseConnection,
    user_id: &str,
    owner: &str,
    name: &str,
    number: i32,
) -> Result<Option<PullRequestModel>> {
    let id = ident::pull_request_id(user_id, owner, name, number);
    PullRequest::find_by_id(id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Find a pull request by primary key.
pub async fn find_pull_request_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<PullRequestModel>> {
    PullRequest::find_by_id(id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Open pull requests for one user, most recently updated first.
pub async fn list_open_pull_requests(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<PullRequestModel>> {
    PullRequest::find()
        .filter(PullRequestColumn::UserId.eq(user_id))
        .filter(PullRequestColumn::State.eq("open"))
        .order_by_desc(PullRequestColumn::UpdatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Pull requests of one repository.
pub async fn list_pull_requests_for_repository(
    db: &DatabaseConnection,
    repository_id: Uuid,
) -> Result<Vec<PullRequestModel>> {
    PullRequest::find()
        .filter(PullRequestColumn::RepositoryId.eq(repository_id))
        .order_by_desc(PullRequestColumn::Number)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Toggle a path in a pull request's viewed-files set and return the new set.
///
/// This is local-only state: the column is written here and nowhere else, so
/// toggling twice always restores the original set regardless of concurrent
/// sync or webhook writes to the same row.
pub async fn toggle_viewed_file(
    db: &DatabaseConnection,
    pull_request_id: Uuid,
    path: &str,
) -> Result<Vec<String>> {
    let pr = find_pull_request_by_id(db, pull_request_id)
        .await?
        .ok_or_else(|| StoreError::not_found_by_id("pull request", pull_request_id))?;

    let mut viewed = pr.viewed_files_list();
    match viewed.iter().position(|p| p == path) {
        Some(idx) => {
            viewed.remove(idx);
        }
        None => viewed.push(path.to_string()),
    }

    let update = crate::entity::pull_request::ActiveModel {
        id: ActiveValue::Unchanged(pull_request_id),
        viewed_files: Set(serde_json::json!(viewed)),
        ..Default::default()
    };
    update.update(db).await?;

    Ok(viewed)
}

// ─── Issues ──────────────────────────────────────────────────────────────────

/// Find an issue by its natural key.
pub async fn find_issue(
    db: &DatabaseConnection,
    user_id: &str,
    owner: &str,
    name: &str,
    number: i32,
) -> Result<Option<IssueModel>> {
    let id = ident::issue_id(user_id, owner, name, number);
    Issue::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Find an issue by primary key.
pub async fn find_issue_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<IssueModel>> {
    Issue::find_by_id(id).one(db).await.map_err(Into::into)
}

// ─── Reviews and comments ────────────────────────────────────────────────────

/// Reviews of one pull request in submission order.
pub async fn list_reviews_for_pull_request(
    db: &DatabaseConnection,
    pull_request_id: Uuid,
) -> Result<Vec<ReviewModel>> {
    Review::find()
        .filter(ReviewColumn::PullRequestId.eq(pull_request_id))
        .order_by_asc(ReviewColumn::SubmittedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Comments attached to one pull request in creation order.
pub async fn list_comments_for_pull_request(
    db: &DatabaseConnection,
    pull_request_id: Uuid,
) -> Result<Vec<CommentModel>> {
    Comment::find()
        .filter(CommentColumn::PullRequestId.eq(pull_request_id))
        .order_by_asc(CommentColumn::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Comments attached to one issue in creation order.
pub async fn list_comments_for_issue(
    db: &DatabaseConnection,
    issue_id: Uuid,
) -> Result<Vec<CommentModel>> {
    Comment::find()
        .filter(CommentColumn::IssueId.eq(issue_id))
        .order_by_asc(CommentColumn::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

// ─── Check runs ──────────────────────────────────────────────────────────────

/// Check runs recorded for one commit of a repository.
pub async fn list_check_runs_for_commit(
    db: &DatabaseConnection,
    repository_id: Uuid,
    head_sha: &str,
) -> Result<Vec<CheckRunModel>> {
    CheckRun::find()
        .filter(CheckRunColumn::RepositoryId.eq(repository_id))
        .filter(CheckRunColumn::HeadSha.eq(head_sha))
        .order_by_asc(CheckRunColumn::Name)
        .all(db)
        .await
        .map_err(Into::into)
}
