//! Incremental sync engine.
//!
//! Pull-based mirroring: each sync unit claims its state row, pages through
//! the host collection from the stored cursor, upserts every record under
//! its deterministic ID, and releases the row as `completed` or `error`.
//!
//! # Module Structure
//!
//! - [`types`](self) - `SyncOptions`, `SyncStats`, `SyncOutcome`, constants
//! - `progress` - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - `state` - Sync-state rows: fetch-or-create, claim, release, reset
//! - `engine` - Per-resource sync units
//! - `full` - Phased full sync across all units of an account

mod engine;
mod error;
mod full;
mod progress;
mod state;
mod types;

// Re-export types
pub use types::{
    DetailSyncOutcome, FullSyncResult, PhaseResult, SyncOptions, SyncOutcome, SyncStats,
};

// Re-export constants
pub use types::{DEFAULT_PAGE_SIZE, INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_TRANSIENT_RETRIES};

// Re-export progress types
pub use progress::{ProgressCallback, SyncProgress, emit};

// Re-export errors
pub use error::SyncError;

// Re-export state-row operations
pub use state::{
    BeginSync, credential_blocked, fetch_or_create_sync_state, list_sync_states,
    mark_credential_invalid, mark_sync_auth_invalid, mark_sync_completed, mark_sync_error,
    reconnect_credential, reset_sync_state, try_begin_sync, update_sync_progress,
};

// Re-export sync units
pub use engine::{
    sync_check_runs, sync_comments, sync_commit, sync_issues, sync_pull_request_detail,
    sync_pull_requests, sync_repositories, sync_reviews, sync_tree,
};

// Re-export the full-sync runner
pub use full::{FullSyncOptions, FullSyncOutcome, WebhookRegistration, full_sync};
