//! Typed webhook payloads and event dispatch.
//!
//! Each handled event name maps to a payload struct that reuses the REST
//! types from [`crate::github`], so a webhook mutation flows through the
//! same conversions as a pull sync. Unknown event names and payloads that
//! fail to deserialize are rejected, never coerced.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::IngestError;
use crate::github::{
    GitHubCheckRun, GitHubComment, GitHubIssue, GitHubPullRequest, GitHubRepo, GitHubReview,
};

/// The slice of an embedded pull request object the ingestor needs to
/// resolve its mirrored parent row.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPullRequestRef {
    /// Pull request number within the repository.
    pub number: i32,
}

/// `pull_request` event payload.
///
/// Event docs: https://docs.github.com/webhooks/webhook-events-and-payloads#pull_request
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    /// Detail-grade pull request object, including `merged` and `mergeable`.
    pub pull_request: GitHubPullRequest,
    pub repository: GitHubRepo,
}

/// `pull_request_review` event payload.
///
/// Event docs: https://docs.github.com/webhooks/webhook-events-and-payloads#pull_request_review
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewEvent {
    pub action: String,
    pub review: GitHubReview,
    pub pull_request: EventPullRequestRef,
    pub repository: GitHubRepo,
}

/// `issue_comment` event payload. Fires for comments on issues and on the
/// issue side of pull requests; the embedded issue carries the marker that
/// distinguishes the two.
///
/// Event docs: https://docs.github.com/webhooks/webhook-events-and-payloads#issue_comment
#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentEvent {
    pub action: String,
    pub comment: GitHubComment,
    pub issue: GitHubIssue,
    pub repository: GitHubRepo,
}

/// `pull_request_review_comment` event payload.
///
/// Event docs: https://docs.github.com/webhooks/webhook-events-and-payloads#pull_request_review_comment
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewCommentEvent {
    pub action: String,
    pub comment: GitHubComment,
    pub pull_request: EventPullRequestRef,
    pub repository: GitHubRepo,
}

/// `issues` event payload.
///
/// Event docs: https://docs.github.com/webhooks/webhook-events-and-payloads#issues
#[derive(Debug, Clone, Deserialize)]
pub struct IssuesEvent {
    pub action: String,
    pub issue: GitHubIssue,
    pub repository: GitHubRepo,
}

/// `check_run` event payload.
///
/// Event docs: https://docs.github.com/webhooks/webhook-events-and-payloads#check_run
#[derive(Debug, Clone, Deserialize)]
pub struct CheckRunEvent {
    pub action: String,
    pub check_run: GitHubCheckRun,
    pub repository: GitHubRepo,
}

/// A delivery dispatched on its `X-GitHub-Event` header.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    /// Sent by the host on hook creation; carries nothing to mirror.
    Ping,
    PullRequest(PullRequestEvent),
    Review(ReviewEvent),
    IssueComment(IssueCommentEvent),
    ReviewComment(ReviewCommentEvent),
    Issues(IssuesEvent),
    CheckRun(CheckRunEvent),
}

impl WebhookEvent {
    /// Dispatch a verified payload on its event name.
    pub fn parse(event: &str, payload: &Value) -> Result<Self, IngestError> {
        match event {
            "ping" => Ok(Self::Ping),
            "pull_request" => Ok(Self::PullRequest(decode(event, payload)?)),
            "pull_request_review" => Ok(Self::Review(decode(event, payload)?)),
            "issue_comment" => Ok(Self::IssueComment(decode(event, payload)?)),
            "pull_request_review_comment" => Ok(Self::ReviewComment(decode(event, payload)?)),
            "issues" => Ok(Self::Issues(decode(event, payload)?)),
            "check_run" => Ok(Self::CheckRun(decode(event, payload)?)),
            other => Err(IngestError::UnsupportedEvent {
                event: other.to_string(),
            }),
        }
    }
}

fn decode<T: DeserializeOwned>(event: &str, payload: &Value) -> Result<T, IngestError> {
    serde_json::from_value(payload.clone()).map_err(|source| IngestError::malformed(event, source))
}
