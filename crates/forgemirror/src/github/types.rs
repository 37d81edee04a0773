//! GitHub API data types and the host operation surface.
//!
//! The payload structs deserialize GitHub REST responses. We define only the
//! fields we store or act on, which keeps the decoder resilient to API
//! additions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::github::error::HostError;
pub use crate::github::rate_limit::RateLimitSnapshot;

/// GitHub user reference as it appears nested in other payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    /// Account ID.
    #[serde(default)]
    pub id: i64,
    /// Login name.
    pub login: String,
}

/// Label reference nested in pull request and issue payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubLabel {
    /// Label name.
    pub name: String,
}

/// Base or head of a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubBranchRef {
    /// Branch name.
    #[serde(rename = "ref")]
    pub branch: String,
    /// Commit SHA at the tip.
    pub sha: String,
}

/// Repository payload.
///
/// API docs: https://docs.github.com/rest/repos/repos#get-a-repository
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    /// Repository ID.
    pub id: i64,
    /// Repository name without the owner.
    pub name: String,
    /// Owner account.
    pub owner: GitHubUser,
    /// Repository description.
    pub description: Option<String>,
    /// Whether the repository is private.
    #[serde(default)]
    pub private: bool,
    /// Whether the repository is a fork.
    #[serde(default)]
    pub fork: bool,
    /// Whether the repository is archived.
    #[serde(default)]
    pub archived: bool,
    /// Default branch name.
    pub default_branch: Option<String>,
    /// HTML URL to the repository.
    pub html_url: Option<String>,
    /// When code was last pushed.
    pub pushed_at: Option<DateTime<Utc>>,
    /// When the repository was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the repository was last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl GitHubRepo {
    /// `owner/name` form used in refs and logs.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner.login, self.name)
    }
}

/// Pull request payload.
///
/// List responses omit `merged` and `mergeable`; both default to their
/// absent forms so one struct covers list and detail fetches.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubPullRequest {
    /// Pull request ID.
    pub id: i64,
    /// Number within the repository.
    pub number: i32,
    /// Title.
    pub title: String,
    /// Body text.
    pub body: Option<String>,
    /// Lifecycle state: "open" or "closed".
    pub state: String,
    /// Whether the PR is a draft.
    #[serde(default)]
    pub draft: bool,
    /// Whether the PR was merged (detail responses only).
    #[serde(default)]
    pub merged: bool,
    /// Whether the PR is mergeable (detail responses only).
    #[serde(default)]
    pub mergeable: Option<bool>,
    /// Whether the conversation is locked.
    #[serde(default)]
    pub locked: bool,
    /// Author. Absent for deleted accounts.
    pub user: Option<GitHubUser>,
    /// Merge target.
    pub base: GitHubBranchRef,
    /// Proposed changes.
    pub head: GitHubBranchRef,
    /// Attached labels.
    #[serde(default)]
    pub labels: Vec<GitHubLabel>,
    /// Users whose review was requested.
    #[serde(default)]
    pub requested_reviewers: Vec<GitHubUser>,
    /// When the PR was opened.
    pub created_at: Option<DateTime<Utc>>,
    /// When the PR was last updated.
    pub updated_at: Option<DateTime<Utc>>,
    /// When the PR was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// When the PR was merged.
    pub merged_at: Option<DateTime<Utc>>,
}

impl GitHubPullRequest {
    /// Author login, "ghost" when the account was deleted.
    #[must_use]
    pub fn author_login(&self) -> &str {
        self.user.as_ref().map_or("ghost", |u| u.login.as_str())
    }

    /// Whether the PR is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == "open"
    }
}

/// Issue payload.
///
/// The issues list endpoint also returns pull requests; those carry a
/// `pull_request` key that marks them as the issue-side of a PR.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubIssue {
    /// Issue ID.
    pub id: i64,
    /// Number within the repository.
    pub number: i32,
    /// Title.
    pub title: String,
    /// Body text.
    pub body: Option<String>,
    /// Lifecycle state: "open" or "closed".
    pub state: String,
    /// Whether the conversation is locked.
    #[serde(default)]
    pub locked: bool,
    /// Author. Absent for deleted accounts.
    pub user: Option<GitHubUser>,
    /// Attached labels.
    #[serde(default)]
    pub labels: Vec<GitHubLabel>,
    /// Assigned users.
    #[serde(default)]
    pub assignees: Vec<GitHubUser>,
    /// Comment count.
    #[serde(default)]
    pub comments: i32,
    /// Present when this issue is the issue-side of a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
    /// When the issue was opened.
    pub created_at: Option<DateTime<Utc>>,
    /// When the issue was last updated.
    pub updated_at: Option<DateTime<Utc>>,
    /// When the issue was closed.
    pub closed_at: Option<DateTime<Utc>>,
}

impl GitHubIssue {
    /// Author login, "ghost" when the account was deleted.
    #[must_use]
    pub fn author_login(&self) -> &str {
        self.user.as_ref().map_or("ghost", |u| u.login.as_str())
    }

    /// Whether this record is the issue-side of a pull request.
    #[must_use]
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Pull request review payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubReview {
    /// Review ID.
    pub id: i64,
    /// Reviewer. Absent for deleted accounts.
    pub user: Option<GitHubUser>,
    /// Verdict: "APPROVED", "CHANGES_REQUESTED", "COMMENTED", "DISMISSED".
    pub state: String,
    /// Review body text.
    pub body: Option<String>,
    /// Commit the review applies to.
    #[serde(default)]
    pub commit_id: Option<String>,
    /// When the review was submitted.
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Issue or review comment payload.
///
/// Review comments carry `path` and `line`; issue comments do not.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubComment {
    /// Comment ID.
    pub id: i64,
    /// Author. Absent for deleted accounts.
    pub user: Option<GitHubUser>,
    /// Comment text.
    #[serde(default)]
    pub body: String,
    /// File the comment is anchored to.
    #[serde(default)]
    pub path: Option<String>,
    /// Line the comment is anchored to.
    #[serde(default)]
    pub line: Option<i32>,
    /// When the comment was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the comment was last edited.
    pub updated_at: Option<DateTime<Utc>>,
}

impl GitHubComment {
    /// Author login, "ghost" when the account was deleted.
    #[must_use]
    pub fn author_login(&self) -> &str {
        self.user.as_ref().map_or("ghost", |u| u.login.as_str())
    }
}

/// Check run payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCheckRun {
    /// Check run ID.
    pub id: i64,
    /// Check name as shown in the UI.
    pub name: String,
    /// Commit the check ran against.
    pub head_sha: String,
    /// Execution state: "queued", "in_progress", "completed".
    pub status: String,
    /// Outcome once completed: "success", "failure", "neutral", ...
    pub conclusion: Option<String>,
    /// Link to the check's output.
    #[serde(default)]
    pub details_url: Option<String>,
    /// When execution started.
    pub started_at: Option<DateTime<Utc>>,
    /// When execution finished.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Envelope of the check-runs-for-ref endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCheckRunList {
    /// Total number of check runs for the ref.
    pub total_count: i64,
    /// Check runs on this page.
    #[serde(default)]
    pub check_runs: Vec<GitHubCheckRun>,
}

/// One entry of a git tree.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubTreeEntry {
    /// Path relative to the repository root.
    pub path: String,
    /// "blob", "tree", or "commit" (submodule).
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Object SHA.
    pub sha: Option<String>,
    /// File mode.
    #[serde(default)]
    pub mode: Option<String>,
    /// Blob size in bytes.
    #[serde(default)]
    pub size: Option<i64>,
}

/// Git tree payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubTree {
    /// Tree SHA.
    pub sha: String,
    /// Whether the listing was cut off by the API's entry limit.
    #[serde(default)]
    pub truncated: bool,
    /// Tree entries.
    #[serde(default)]
    pub tree: Vec<GitHubTreeEntry>,
}

/// Author or committer signature inside a commit object.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubGitActor {
    /// Name recorded in the commit.
    pub name: Option<String>,
    /// Email recorded in the commit.
    pub email: Option<String>,
    /// Signature timestamp.
    pub date: Option<DateTime<Utc>>,
}

/// Nested git-object detail of a commit payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommitDetail {
    /// Commit message.
    pub message: String,
    /// Author signature.
    pub author: Option<GitHubGitActor>,
    /// Committer signature.
    pub committer: Option<GitHubGitActor>,
}

/// Parent reference inside a commit payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommitRef {
    /// Parent commit SHA.
    pub sha: String,
}

/// Commit payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommit {
    /// Commit SHA.
    pub sha: String,
    /// Git-object detail.
    pub commit: GitHubCommitDetail,
    /// HTML URL to the commit.
    #[serde(default)]
    pub html_url: Option<String>,
    /// GitHub account of the author, when resolvable.
    #[serde(default)]
    pub author: Option<GitHubUser>,
    /// Parent commits.
    #[serde(default)]
    pub parents: Vec<GitHubCommitRef>,
}

/// Webhook configuration nested in a hook payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubHookConfig {
    /// Delivery URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Payload encoding, "json" or "form".
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Repository webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubHook {
    /// Hook ID.
    pub id: i64,
    /// Whether deliveries are enabled.
    #[serde(default)]
    pub active: bool,
    /// Event names the hook subscribes to.
    #[serde(default)]
    pub events: Vec<String>,
    /// Delivery configuration.
    #[serde(default)]
    pub config: GitHubHookConfig,
}

/// Authenticated-user payload, used to validate a credential.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAuthUser {
    /// Account ID.
    pub id: i64,
    /// Login name.
    pub login: String,
    /// Display name.
    pub name: Option<String>,
}

/// How to combine a pull request's commits on merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Merge commit.
    #[default]
    Merge,
    /// Squash into one commit.
    Squash,
    /// Rebase onto the base branch.
    Rebase,
}

impl MergeMethod {
    /// Wire value of the merge method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Squash => "squash",
            Self::Rebase => "rebase",
        }
    }
}

/// Parameters of a merge operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MergeRequest {
    /// How to combine the commits.
    #[serde(default)]
    pub method: MergeMethod,
    /// Title for the merge commit.
    #[serde(default)]
    pub commit_title: Option<String>,
    /// Body for the merge commit.
    #[serde(default)]
    pub commit_message: Option<String>,
    /// Head SHA the merge must apply to. The host rejects the merge when
    /// the branch moved past this commit.
    #[serde(default)]
    pub expected_head_sha: Option<String>,
}

/// Host response to a merge.
#[derive(Debug, Clone, Deserialize)]
pub struct MergeOutcome {
    /// Whether the merge happened.
    pub merged: bool,
    /// SHA of the merge commit.
    #[serde(default)]
    pub sha: Option<String>,
    /// Human-readable status from the host.
    #[serde(default)]
    pub message: String,
}

/// Review verdict for a submitted review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewVerdict {
    /// Approve the changes.
    Approve,
    /// Block until changes are made.
    RequestChanges,
    /// Comment without a verdict.
    Comment,
}

impl ReviewVerdict {
    /// Wire value of the verdict.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::RequestChanges => "REQUEST_CHANGES",
            Self::Comment => "COMMENT",
        }
    }
}

/// Parameters of a review submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewSubmission {
    /// Verdict to attach.
    pub verdict: ReviewVerdict,
    /// Review body text.
    #[serde(default)]
    pub body: Option<String>,
    /// Commit the review applies to. Defaults to the PR head.
    #[serde(default)]
    pub commit_id: Option<String>,
}

/// One page of a paginated collection fetch.
#[derive(Debug, Clone)]
pub struct CollectionPage<T> {
    /// Decoded records on this page.
    pub records: Vec<T>,
    /// Opaque cursor for the next page; `None` on the last page.
    pub next_cursor: Option<String>,
    /// Collection validator, captured on the first page only. Stored on
    /// completion and replayed as `If-None-Match` next time around.
    pub etag: Option<String>,
    /// Quota state reported alongside this page.
    pub rate_limit: Option<RateLimitSnapshot>,
}

/// Outcome of a conditional collection fetch.
#[derive(Debug, Clone)]
pub enum CollectionFetch<T> {
    /// The stored validator still matches; nothing changed upstream.
    NotModified,
    /// A page of records.
    Page(CollectionPage<T>),
}

impl<T> CollectionFetch<T> {
    /// The page, when the fetch produced one.
    pub fn into_page(self) -> Option<CollectionPage<T>> {
        match self {
            Self::NotModified => None,
            Self::Page(page) => Some(page),
        }
    }
}

/// Outcome of a conditional single-object fetch.
#[derive(Debug, Clone)]
pub enum DetailFetch<T> {
    /// The stored validator still matches; nothing changed upstream.
    NotModified,
    /// The decoded payload with its validator.
    Fetched {
        /// Decoded payload.
        value: T,
        /// Validator to replay as `If-None-Match` next time around.
        etag: Option<String>,
    },
}

impl<T> DetailFetch<T> {
    /// The payload, when the fetch produced one.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::NotModified => None,
            Self::Fetched { value, .. } => Some(value),
        }
    }
}

/// Operations the remote host exposes.
///
/// `GitHubClient` is the production implementation; tests substitute fakes
/// to drive the sync engine without a network.
#[async_trait]
pub trait HostApi: Send + Sync {
    /// Validate the credential and identify its account.
    async fn fetch_authenticated_user(&self) -> Result<GitHubAuthUser, HostError>;

    /// List repositories the credential can access, one page per call.
    async fn list_repositories(
        &self,
        cursor: Option<&str>,
        etag: Option<&str>,
    ) -> Result<CollectionFetch<GitHubRepo>, HostError>;

    /// Fetch one repository.
    async fn fetch_repository(&self, owner: &str, name: &str) -> Result<GitHubRepo, HostError>;

    /// List pull requests in all states, one page per call.
    async fn list_pull_requests(
        &self,
        owner: &str,
        name: &str,
        cursor: Option<&str>,
        etag: Option<&str>,
    ) -> Result<CollectionFetch<GitHubPullRequest>, HostError>;

    /// Fetch one pull request with detail-only fields.
    async fn fetch_pull_request(
        &self,
        owner: &str,
        name: &str,
        number: i32,
    ) -> Result<GitHubPullRequest, HostError>;

    /// List reviews on a pull request, one page per call.
    async fn list_reviews(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        cursor: Option<&str>,
        etag: Option<&str>,
    ) -> Result<CollectionFetch<GitHubReview>, HostError>;

    /// List review comments on a pull request, one page per call.
    async fn list_review_comments(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        cursor: Option<&str>,
        etag: Option<&str>,
    ) -> Result<CollectionFetch<GitHubComment>, HostError>;

    /// List issue comments on an issue or pull request, one page per call.
    async fn list_issue_comments(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        cursor: Option<&str>,
        etag: Option<&str>,
    ) -> Result<CollectionFetch<GitHubComment>, HostError>;

    /// List issues in all states, one page per call. Includes the
    /// issue-side of pull requests.
    async fn list_issues(
        &self,
        owner: &str,
        name: &str,
        cursor: Option<&str>,
        etag: Option<&str>,
    ) -> Result<CollectionFetch<GitHubIssue>, HostError>;

    /// List check runs for a commit or branch, one page per call.
    async fn list_check_runs(
        &self,
        owner: &str,
        name: &str,
        git_ref: &str,
        cursor: Option<&str>,
        etag: Option<&str>,
    ) -> Result<CollectionFetch<GitHubCheckRun>, HostError>;

    /// Fetch the file tree at a ref. Content is served straight to the
    /// caller; only the validator is meant to be persisted.
    async fn fetch_tree(
        &self,
        owner: &str,
        name: &str,
        git_ref: &str,
        recursive: bool,
        etag: Option<&str>,
    ) -> Result<DetailFetch<GitHubTree>, HostError>;

    /// Fetch one commit. Content is served straight to the caller; only the
    /// validator is meant to be persisted.
    async fn fetch_commit(
        &self,
        owner: &str,
        name: &str,
        git_ref: &str,
        etag: Option<&str>,
    ) -> Result<DetailFetch<GitHubCommit>, HostError>;

    /// Merge a pull request.
    async fn merge_pull_request(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        request: &MergeRequest,
    ) -> Result<MergeOutcome, HostError>;

    /// Add labels to an issue or pull request. Returns the full label set
    /// after the addition.
    async fn add_labels(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        labels: &[String],
    ) -> Result<Vec<GitHubLabel>, HostError>;

    /// Remove one label. Returns the labels that remain.
    async fn remove_label(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        label: &str,
    ) -> Result<Vec<GitHubLabel>, HostError>;

    /// Submit a review on a pull request.
    async fn submit_review(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        submission: &ReviewSubmission,
    ) -> Result<GitHubReview, HostError>;

    /// Request reviews from users.
    async fn request_reviewers(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        reviewers: &[String],
    ) -> Result<(), HostError>;

    /// Lock or unlock a conversation.
    async fn set_locked(
        &self,
        owner: &str,
        name: &str,
        number: i32,
        locked: bool,
        reason: Option<&str>,
    ) -> Result<(), HostError>;

    /// Make sure the repository has a webhook pointing at `callback_url`.
    /// Returns true when a hook was created, false when one already existed.
    async fn ensure_webhook(
        &self,
        owner: &str,
        name: &str,
        callback_url: &str,
        secret: &str,
    ) -> Result<bool, HostError>;

    /// Last quota state seen on any response, if one was observed.
    fn rate_limit_snapshot(&self) -> Option<RateLimitSnapshot>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_request_parses_list_payload() {
        let json = r#"{
            "id": 9001,
            "number": 42,
            "title": "Add widget support",
            "body": "Widgets for everyone",
            "state": "open",
            "draft": false,
            "locked": false,
            "user": {"id": 7, "login": "octocat"},
            "base": {"ref": "main", "sha": "aaa111"},
            "head": {"ref": "feature/widgets", "sha": "bbb222"},
            "labels": [{"name": "enhancement"}],
            "requested_reviewers": [{"id": 8, "login": "hubot"}],
            "created_at": "2026-01-10T12:00:00Z",
            "updated_at": "2026-01-11T08:30:00Z",
            "closed_at": null,
            "merged_at": null
        }"#;

        let pr: GitHubPullRequest = serde_json::from_str(json).unwrap();

        assert_eq!(pr.number, 42);
        assert_eq!(pr.author_login(), "octocat");
        assert!(pr.is_open());
        // List payloads omit merged/mergeable.
        assert!(!pr.merged);
        assert_eq!(pr.mergeable, None);
        assert_eq!(pr.base.branch, "main");
        assert_eq!(pr.head.sha, "bbb222");
        assert_eq!(pr.labels[0].name, "enhancement");
        assert_eq!(pr.requested_reviewers[0].login, "hubot");
    }

    #[test]
    fn pull_request_without_author_reports_ghost() {
        let json = r#"{
            "id": 9002,
            "number": 43,
            "title": "Orphaned",
            "body": null,
            "state": "closed",
            "user": null,
            "base": {"ref": "main", "sha": "aaa111"},
            "head": {"ref": "fix", "sha": "ccc333"}
        }"#;

        let pr: GitHubPullRequest = serde_json::from_str(json).unwrap();

        assert_eq!(pr.author_login(), "ghost");
        assert!(!pr.is_open());
        assert!(pr.labels.is_empty());
    }

    #[test]
    fn issue_detects_pull_request_marker() {
        let json = r#"{
            "id": 500,
            "number": 42,
            "title": "Add widget support",
            "state": "open",
            "user": {"login": "octocat"},
            "pull_request": {"url": "https://api.github.com/repos/o/r/pulls/42"}
        }"#;

        let issue: GitHubIssue = serde_json::from_str(json).unwrap();
        assert!(issue.is_pull_request());

        let plain = r#"{
            "id": 501,
            "number": 7,
            "title": "Crash on save",
            "state": "open",
            "user": {"login": "octocat"}
        }"#;

        let issue: GitHubIssue = serde_json::from_str(plain).unwrap();
        assert!(!issue.is_pull_request());
        assert_eq!(issue.comments, 0);
    }

    #[test]
    fn check_run_list_envelope_parses() {
        let json = r#"{
            "total_count": 2,
            "check_runs": [
                {
                    "id": 1,
                    "name": "build",
                    "head_sha": "bbb222",
                    "status": "completed",
                    "conclusion": "success",
                    "started_at": "2026-01-11T08:00:00Z",
                    "completed_at": "2026-01-11T08:05:00Z"
                },
                {
                    "id": 2,
                    "name": "lint",
                    "head_sha": "bbb222",
                    "status": "in_progress",
                    "conclusion": null
                }
            ]
        }"#;

        let list: GitHubCheckRunList = serde_json::from_str(json).unwrap();

        assert_eq!(list.total_count, 2);
        assert_eq!(list.check_runs[0].conclusion.as_deref(), Some("success"));
        assert_eq!(list.check_runs[1].status, "in_progress");
    }

    #[test]
    fn tree_parses_entries() {
        let json = r#"{
            "sha": "treesha",
            "truncated": false,
            "tree": [
                {"path": "src/main.rs", "type": "blob", "sha": "blob1", "mode": "100644", "size": 1024},
                {"path": "src", "type": "tree", "sha": "sub1", "mode": "040000"}
            ]
        }"#;

        let tree: GitHubTree = serde_json::from_str(json).unwrap();

        assert_eq!(tree.tree.len(), 2);
        assert_eq!(tree.tree[0].entry_type, "blob");
        assert_eq!(tree.tree[0].size, Some(1024));
        assert_eq!(tree.tree[1].size, None);
    }

    #[test]
    fn merge_outcome_parses_host_response() {
        let json = r#"{"sha": "merged123", "merged": true, "message": "Pull Request successfully merged"}"#;
        let outcome: MergeOutcome = serde_json::from_str(json).unwrap();

        assert!(outcome.merged);
        assert_eq!(outcome.sha.as_deref(), Some("merged123"));
    }

    #[test]
    fn merge_method_wire_values() {
        assert_eq!(MergeMethod::Merge.as_str(), "merge");
        assert_eq!(MergeMethod::Squash.as_str(), "squash");
        assert_eq!(MergeMethod::Rebase.as_str(), "rebase");

        let parsed: MergeMethod = serde_json::from_str(r#""squash""#).unwrap();
        assert_eq!(parsed, MergeMethod::Squash);
    }

    #[test]
    fn review_verdict_wire_values() {
        assert_eq!(ReviewVerdict::RequestChanges.as_str(), "REQUEST_CHANGES");

        let parsed: ReviewVerdict = serde_json::from_str(r#""APPROVE""#).unwrap();
        assert_eq!(parsed, ReviewVerdict::Approve);
    }

    #[test]
    fn merge_request_defaults_to_merge_commit() {
        let request: MergeRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.method, MergeMethod::Merge);
        assert!(request.expected_head_sha.is_none());
    }

    #[test]
    fn collection_fetch_into_page() {
        let fetch: CollectionFetch<GitHubRepo> = CollectionFetch::NotModified;
        assert!(fetch.into_page().is_none());

        let fetch = CollectionFetch::Page(CollectionPage::<GitHubRepo> {
            records: Vec::new(),
            next_cursor: Some("2".to_string()),
            etag: None,
            rate_limit: None,
        });
        let page = fetch.into_page().unwrap();
        assert_eq!(page.next_cursor.as_deref(), Some("2"));
    }
}
