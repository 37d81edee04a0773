//! Shared sync types and constants.

use crate::retry::RetryConfig;

/// Records requested per collection page. GitHub caps `per_page` at 100.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Initial backoff delay in milliseconds for retryable host errors.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Maximum backoff delay in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Retries for a transient or rate-limited request before the unit fails.
pub const MAX_TRANSIENT_RETRIES: u32 = 3;

/// Options for running a sync unit.
///
/// Page size is a client construction concern; see
/// [`GitHubClient::with_page_size`](crate::github::GitHubClient::with_page_size).
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Backoff schedule for retryable host errors.
    pub retry: RetryConfig,
}

/// Counters accumulated while a sync unit runs.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Pages fetched from the host.
    pub pages: usize,
    /// Records written to the store.
    pub upserted: usize,
    /// Records skipped because of per-record conversion failures.
    pub skipped: usize,
    /// Whether the conditional fetch short-circuited with no changes.
    pub not_modified: bool,
    /// Non-fatal per-record errors.
    pub errors: Vec<String>,
}

/// How a sync unit run ended.
///
/// Host and store failures are reported through `SyncError` instead; by the
/// time the caller sees them the unit's state row already records the
/// failure.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The unit ran to completion and its state row is `completed`.
    Completed(SyncStats),
    /// Another runner holds the unit. Nothing was fetched or written.
    AlreadyRunning,
    /// The account's credential is marked invalid. Sync refuses to start
    /// until the credential is reconnected.
    CredentialBlocked,
}

impl SyncOutcome {
    /// Stats when the unit completed.
    #[must_use]
    pub fn stats(&self) -> Option<&SyncStats> {
        match self {
            Self::Completed(stats) => Some(stats),
            _ => None,
        }
    }
}

/// How a detail sync unit run ended.
///
/// Tree and commit units mirror nothing; the state row exists so the
/// validator can be replayed, and the fetched content goes straight back to
/// the caller.
#[derive(Debug)]
pub enum DetailSyncOutcome<T> {
    /// Fresh content from the host.
    Fetched(T),
    /// The stored validator still matches; the caller's copy is current.
    NotModified,
    /// Another runner holds the unit. Nothing was fetched.
    AlreadyRunning,
    /// The account's credential is marked invalid.
    CredentialBlocked,
}

/// Result of one phase of a full sync.
#[derive(Debug, Default)]
pub struct PhaseResult {
    /// Phase name: "repositories", "pull_requests", "issues", "webhooks".
    pub phase: String,
    /// Units that completed.
    pub successful: usize,
    /// Units that failed without aborting the run.
    pub failed: usize,
    /// Short error per failed unit.
    pub errors: Vec<String>,
}

/// Result of a full sync run.
#[derive(Debug, Default)]
pub struct FullSyncResult {
    /// Per-phase results, in execution order.
    pub phases: Vec<PhaseResult>,
    /// Why the run stopped early, when a credential failure aborted it.
    pub aborted: Option<String>,
}

impl FullSyncResult {
    /// Whether every phase finished with no failures.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.aborted.is_none() && self.phases.iter().all(|p| p.failed == 0)
    }

    /// Total failed units across phases.
    #[must_use]
    pub fn total_failed(&self) -> usize {
        self.phases.iter().map(|p| p.failed).sum()
    }
}
