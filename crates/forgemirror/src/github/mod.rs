//! GitHub API client for mirror operations.
//!
//! This module talks to the GitHub REST API: conditional collection and
//! detail fetches with cursor/ETag resumption, write operations on pull
//! requests and issues, and conversion of API payloads into mirrored rows.
//!
//! # Module Structure
//!
//! - [`error`] - Host error taxonomy and response classification
//! - [`types`] - API payload structs and the [`HostApi`] operation trait
//! - [`client`] - The production [`GitHubClient`]
//! - [`convert`] - Model conversion to mirrored entities
//! - [`pagination`] - Link-header parsing
//! - [`rate_limit`] - Quota snapshots and request pacing
//!
//! # Usage
//!
//! ```ignore
//! use forgemirror::github::{ApiRateLimiter, GitHubClient};
//!
//! let client = GitHubClient::new("ghp_token", Some(ApiRateLimiter::default()))?;
//! let page = client.list_repositories(None, None).await?;
//! ```
//!
//! Syncing into the mirror goes through [`crate::sync`], which drives these
//! operations against the [`HostApi`] seam.

mod client;
mod convert;
mod error;
mod pagination;
mod rate_limit;
mod types;

// Re-export error types
pub use error::{HostError, short_error_message};

// Re-export payload and operation types
pub use types::{
    CollectionFetch, CollectionPage, DetailFetch, GitHubAuthUser, GitHubBranchRef, GitHubCheckRun,
    GitHubComment, GitHubCommit, GitHubCommitDetail, GitHubHook, GitHubIssue, GitHubLabel,
    GitHubPullRequest, GitHubRepo, GitHubReview, GitHubTree, GitHubTreeEntry, GitHubUser, HostApi,
    MergeMethod, MergeOutcome, MergeRequest, ReviewSubmission, ReviewVerdict,
};

// Re-export client
pub use client::{GITHUB_API_BASE, GitHubClient, WEBHOOK_EVENTS};

// Re-export pacing and quota types
pub use rate_limit::{ApiRateLimiter, DEFAULT_RPS, RateLimitSnapshot};

// Re-export model conversion
pub use convert::{
    CommentParent, to_check_run_model, to_comment_model, to_issue_model,
    to_pull_request_detail_model, to_pull_request_model, to_repository_model, to_review_model,
};

// Re-export pagination helpers
pub use pagination::{LinkPagination, parse_link_header};
