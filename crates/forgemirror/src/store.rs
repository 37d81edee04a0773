//! Local store operations for mirrored rows.
//!
//! Writes go through column-aware upserts keyed by deterministic primary
//! key; reads are typed per-entity lookups. Sync state rows have their own
//! state machine in [`crate::sync::state`] and are not handled here.

mod errors;
mod query;
mod upsert;

pub use errors::{Result, StoreError};
pub use query::{
    find_issue, find_issue_by_id, find_pull_request, find_pull_request_by_id, find_repository,
    find_repository_by_remote_id, list_check_runs_for_commit, list_comments_for_issue,
    list_comments_for_pull_request, list_open_pull_requests, list_pull_requests_for_repository,
    list_repositories, list_reviews_for_pull_request, toggle_viewed_file,
};
pub use upsert::{insert_if_absent, merge_upsert};
