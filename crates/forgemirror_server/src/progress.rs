//! Logging progress reporter for sync runs.

use forgemirror::sync::{ProgressCallback, SyncProgress};

/// Progress callback that forwards sync events to tracing.
///
/// Server-side runs have no terminal to draw on, so every progress event
/// becomes a log line. Page-level detail stays at debug; unit and phase
/// boundaries log at info.
pub(crate) fn logging_callback() -> ProgressCallback {
    Box::new(|event| match event {
        SyncProgress::UnitStarted { unit } => {
            tracing::info!("sync {unit}: started");
        }
        SyncProgress::PageStored {
            unit,
            page,
            count,
            total_so_far,
        } => {
            tracing::debug!("sync {unit}: page {page} stored {count} records ({total_so_far} total)");
        }
        SyncProgress::NotModified { unit } => {
            tracing::info!("sync {unit}: nothing changed upstream");
        }
        SyncProgress::RecordSkipped {
            unit,
            reference,
            error,
        } => {
            tracing::warn!("sync {unit}: skipped {reference}: {error}");
        }
        SyncProgress::Backoff {
            unit,
            retry_after_ms,
            attempt,
        } => {
            tracing::warn!("sync {unit}: backing off {retry_after_ms}ms (attempt {attempt})");
        }
        SyncProgress::UnitCompleted { unit, upserted } => {
            tracing::info!("sync {unit}: completed, {upserted} records");
        }
        SyncProgress::UnitFailed { unit, error } => {
            tracing::warn!("sync {unit}: failed: {error}");
        }
        SyncProgress::PhaseStarted { phase, units } => {
            tracing::info!("full sync phase {phase}: {units} units");
        }
        SyncProgress::PhaseCompleted {
            phase,
            successful,
            failed,
        } => {
            tracing::info!("full sync phase {phase}: {successful} ok, {failed} failed");
        }
        SyncProgress::FullSyncCompleted { successful, failed } => {
            tracing::info!("full sync finished: {successful} ok, {failed} failed");
        }
        SyncProgress::Warning { message } => {
            tracing::warn!("sync warning: {message}");
        }
        _ => {}
    })
}
