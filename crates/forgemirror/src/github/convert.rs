//! Model conversion functions for GitHub payloads.
//!
//! Every function derives the row's deterministic primary key from identity
//! fields, so the sync and webhook paths converge on the same row no matter
//! which one writes first. Conversions set exactly the columns their fetch
//! path provides; local-only columns such as a pull request's viewed files
//! are never touched.

use chrono::Utc;
use sea_orm::Set;
use uuid::Uuid;

use super::types::{
    GitHubCheckRun, GitHubComment, GitHubIssue, GitHubPullRequest, GitHubRepo, GitHubReview,
};
use crate::entity::prelude::{
    CheckRunActiveModel, CommentActiveModel, CommentKind, IssueActiveModel, PullRequestActiveModel,
    RepositoryActiveModel, ReviewActiveModel,
};
use crate::ident;

/// Row a comment attaches to. Issue comments on a pull request attach to the
/// pull request row, since the host shares one timeline between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentParent {
    PullRequest(Uuid),
    Issue(Uuid),
}

/// Convert a repository payload to an active model.
pub fn to_repository_model(user_id: &str, repo: &GitHubRepo) -> RepositoryActiveModel {
    let now = Utc::now().fixed_offset();

    RepositoryActiveModel {
        id: Set(ident::repository_id(user_id, &repo.owner.login, &repo.name)),
        user_id: Set(user_id.to_string()),
        remote_id: Set(repo.id),
        owner: Set(repo.owner.login.clone()),
        name: Set(repo.name.clone()),
        description: Set(repo.description.clone()),
        private: Set(repo.private),
        fork: Set(repo.fork),
        archived: Set(repo.archived),
        default_branch: Set(repo
            .default_branch
            .clone()
            .unwrap_or_else(|| "main".to_string())),
        html_url: Set(repo.html_url.clone()),
        pushed_at: Set(repo.pushed_at.map(|t| t.fixed_offset())),
        created_at: Set(repo.created_at.map(|t| t.fixed_offset())),
        updated_at: Set(repo.updated_at.map(|t| t.fixed_offset())),
        synced_at: Set(now),
    }
}

/// Convert a pull request list payload to an active model.
///
/// List responses omit `merged` and `mergeable`, so this conversion leaves
/// both columns unset; [`to_pull_request_detail_model`] covers the detail
/// fetch that provides them.
pub fn to_pull_request_model(
    user_id: &str,
    owner: &str,
    name: &str,
    pr: &GitHubPullRequest,
) -> PullRequestActiveModel {
    let now = Utc::now().fixed_offset();
    let labels: Vec<&str> = pr.labels.iter().map(|l| l.name.as_str()).collect();
    let reviewers: Vec<&str> = pr
        .requested_reviewers
        .iter()
        .map(|u| u.login.as_str())
        .collect();

    PullRequestActiveModel {
        id: Set(ident::pull_request_id(user_id, owner, name, pr.number)),
        repository_id: Set(ident::repository_id(user_id, owner, name)),
        user_id: Set(user_id.to_string()),
        number: Set(pr.number),
        remote_id: Set(pr.id),
        title: Set(pr.title.clone()),
        body: Set(pr.body.clone()),
        state: Set(pr.state.clone()),
        draft: Set(pr.draft),
        locked: Set(pr.locked),
        author_login: Set(pr.author_login().to_string()),
        base_ref: Set(pr.base.branch.clone()),
        head_ref: Set(pr.head.branch.clone()),
        head_sha: Set(pr.head.sha.clone()),
        labels: Set(serde_json::json!(labels)),
        requested_reviewers: Set(serde_json::json!(reviewers)),
        created_at: Set(pr.created_at.map(|t| t.fixed_offset())),
        updated_at: Set(pr.updated_at.map(|t| t.fixed_offset())),
        closed_at: Set(pr.closed_at.map(|t| t.fixed_offset())),
        merged_at: Set(pr.merged_at.map(|t| t.fixed_offset())),
        synced_at: Set(now),
        ..Default::default()
    }
}

/// Convert a pull request detail payload to an active model, including the
/// detail-only `merged` and `mergeable` columns.
pub fn to_pull_request_detail_model(
    user_id: &str,
    owner: &str,
    name: &str,
    pr: &GitHubPullRequest,
) -> PullRequestActiveModel {
    let mut model = to_pull_request_model(user_id, owner, name, pr);
    model.merged = Set(pr.merged);
    model.mergeable = Set(pr.mergeable);
    model
}

/// Convert an issue payload to an active model.
pub fn to_issue_model(
    user_id: &str,
    owner: &str,
    name: &str,
    issue: &GitHubIssue,
) -> IssueActiveModel {
    let now = Utc::now().fixed_offset();
    let labels: Vec<&str> = issue.labels.iter().map(|l| l.name.as_str()).collect();
    let assignees: Vec<&str> = issue.assignees.iter().map(|u| u.login.as_str()).collect();

    IssueActiveModel {
        id: Set(ident::issue_id(user_id, owner, name, issue.number)),
        repository_id: Set(ident::repository_id(user_id, owner, name)),
        user_id: Set(user_id.to_string()),
        number: Set(issue.number),
        remote_id: Set(issue.id),
        title: Set(issue.title.clone()),
        body: Set(issue.body.clone()),
        state: Set(issue.state.clone()),
        locked: Set(issue.locked),
        is_pull_request: Set(issue.is_pull_request()),
        author_login: Set(issue.author_login().to_string()),
        labels: Set(serde_json::json!(labels)),
        assignees: Set(serde_json::json!(assignees)),
        comments_count: Set(Some(issue.comments)),
        created_at: Set(issue.created_at.map(|t| t.fixed_offset())),
        updated_at: Set(issue.updated_at.map(|t| t.fixed_offset())),
        closed_at: Set(issue.closed_at.map(|t| t.fixed_offset())),
        synced_at: Set(now),
    }
}

/// Convert a review payload to an active model.
pub fn to_review_model(
    user_id: &str,
    pull_request_id: Uuid,
    review: &GitHubReview,
) -> ReviewActiveModel {
    let now = Utc::now().fixed_offset();

    ReviewActiveModel {
        id: Set(ident::review_id(user_id, review.id)),
        pull_request_id: Set(pull_request_id),
        user_id: Set(user_id.to_string()),
        remote_id: Set(review.id),
        author_login: Set(review
            .user
            .as_ref()
            .map_or("ghost", |u| u.login.as_str())
            .to_string()),
        state: Set(review.state.clone()),
        body: Set(review.body.clone()),
        commit_sha: Set(review.commit_id.clone()),
        submitted_at: Set(review.submitted_at.map(|t| t.fixed_offset())),
        synced_at: Set(now),
    }
}

/// Convert a comment payload to an active model.
///
/// The kind participates in the deterministic ID because issue comments and
/// review comments have independent remote ID spaces.
pub fn to_comment_model(
    user_id: &str,
    kind: CommentKind,
    parent: CommentParent,
    comment: &GitHubComment,
) -> CommentActiveModel {
    let now = Utc::now().fixed_offset();
    let (pull_request_id, issue_id) = match parent {
        CommentParent::PullRequest(id) => (Some(id), None),
        CommentParent::Issue(id) => (None, Some(id)),
    };

    CommentActiveModel {
        id: Set(ident::comment_id(user_id, kind.as_str(), comment.id)),
        kind: Set(kind),
        pull_request_id: Set(pull_request_id),
        issue_id: Set(issue_id),
        user_id: Set(user_id.to_string()),
        remote_id: Set(comment.id),
        author_login: Set(comment.author_login().to_string()),
        body: Set(comment.body.clone()),
        path: Set(comment.path.clone()),
        line: Set(comment.line),
        created_at: Set(comment.created_at.map(|t| t.fixed_offset())),
        updated_at: Set(comment.updated_at.map(|t| t.fixed_offset())),
        synced_at: Set(now),
    }
}

/// Convert a check run payload to an active model.
pub fn to_check_run_model(
    user_id: &str,
    repository_id: Uuid,
    run: &GitHubCheckRun,
) -> CheckRunActiveModel {
    let now = Utc::now().fixed_offset();

    CheckRunActiveModel {
        id: Set(ident::check_run_id(user_id, run.id)),
        repository_id: Set(repository_id),
        user_id: Set(user_id.to_string()),
        remote_id: Set(run.id),
        head_sha: Set(run.head_sha.clone()),
        name: Set(run.name.clone()),
        status: Set(run.status.clone()),
        conclusion: Set(run.conclusion.clone()),
        details_url: Set(run.details_url.clone()),
        started_at: Set(run.started_at.map(|t| t.fixed_offset())),
        completed_at: Set(run.completed_at.map(|t| t.fixed_offset())),
        synced_at: Set(now),
    }
}
