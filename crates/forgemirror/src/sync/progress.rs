//! Progress reporting types for sync operations.
//!
//! Progress events let callers surface a running sync without polling the
//! state table. The server's background tasks log them; a CLI could draw
//! them.

/// Progress events emitted while sync units run.
///
/// `unit` is the state-row label: resource kind, account ID, and the
/// optional scope ref joined with `/`, e.g. `pull_request/user-1/acme/api`.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// A sync unit claimed its state row and started.
    UnitStarted {
        /// The unit label.
        unit: String,
    },

    /// A fetched page was written to the store.
    PageStored {
        /// The unit label.
        unit: String,
        /// Page number (1-indexed).
        page: u32,
        /// Records on this page.
        count: usize,
        /// Running total of records stored this run.
        total_so_far: usize,
    },

    /// The conditional fetch matched the stored validator; nothing changed
    /// upstream and the unit completed without paging.
    NotModified {
        /// The unit label.
        unit: String,
    },

    /// A single record failed to convert and was skipped.
    RecordSkipped {
        /// The unit label.
        unit: String,
        /// Which record, e.g. a number or SHA.
        reference: String,
        /// Why it was skipped.
        error: String,
    },

    /// A retryable host error; backing off before the next attempt.
    Backoff {
        /// The unit label.
        unit: String,
        /// Time to wait before retry (ms).
        retry_after_ms: u64,
        /// Current attempt number.
        attempt: u32,
    },

    /// The unit finished and its state row is `completed`.
    UnitCompleted {
        /// The unit label.
        unit: String,
        /// Records written this run.
        upserted: usize,
    },

    /// The unit failed and its state row records the error.
    UnitFailed {
        /// The unit label.
        unit: String,
        /// Short error message.
        error: String,
    },

    /// A full-sync phase started.
    PhaseStarted {
        /// Phase name.
        phase: String,
        /// Units the phase will run.
        units: usize,
    },

    /// A full-sync phase finished.
    PhaseCompleted {
        /// Phase name.
        phase: String,
        /// Units that completed.
        successful: usize,
        /// Units that failed.
        failed: usize,
    },

    /// The full sync finished all phases.
    FullSyncCompleted {
        /// Units that completed across phases.
        successful: usize,
        /// Units that failed across phases.
        failed: usize,
    },

    /// Warning message (non-fatal).
    Warning {
        /// Warning message.
        message: String,
    },
}

/// Callback for progress updates during sync operations.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_with_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let callback: ProgressCallback = Box::new(move |_event| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        emit(
            Some(&callback),
            SyncProgress::UnitStarted {
                unit: "repository/user-1".to_string(),
            },
        );
        emit(
            Some(&callback),
            SyncProgress::UnitCompleted {
                unit: "repository/user-1".to_string(),
                upserted: 12,
            },
        );

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_emit_without_callback() {
        // Should not panic when callback is None
        emit(
            None,
            SyncProgress::NotModified {
                unit: "issue/user-1/acme/api".to_string(),
            },
        );
    }

    #[test]
    fn test_events_record_order() {
        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let events_clone = Arc::clone(&events);

        let callback: ProgressCallback = Box::new(move |event| {
            events_clone.lock().unwrap().push(format!("{event:?}"));
        });

        emit(
            Some(&callback),
            SyncProgress::UnitStarted {
                unit: "pull_request/user-1/acme/api".to_string(),
            },
        );
        emit(
            Some(&callback),
            SyncProgress::PageStored {
                unit: "pull_request/user-1/acme/api".to_string(),
                page: 1,
                count: 100,
                total_so_far: 100,
            },
        );
        emit(
            Some(&callback),
            SyncProgress::UnitCompleted {
                unit: "pull_request/user-1/acme/api".to_string(),
                upserted: 100,
            },
        );

        let recorded = events.lock().unwrap();
        assert_eq!(recorded.len(), 3);
        assert!(recorded[0].contains("UnitStarted"));
        assert!(recorded[1].contains("PageStored"));
        assert!(recorded[2].contains("UnitCompleted"));
    }

    #[test]
    fn test_all_variants_constructable() {
        let unit = "check_run/user-1/acme/api".to_string();
        let events: Vec<SyncProgress> = vec![
            SyncProgress::UnitStarted { unit: unit.clone() },
            SyncProgress::PageStored {
                unit: unit.clone(),
                page: 2,
                count: 30,
                total_so_far: 130,
            },
            SyncProgress::NotModified { unit: unit.clone() },
            SyncProgress::RecordSkipped {
                unit: unit.clone(),
                reference: "#42".to_string(),
                error: "missing field".to_string(),
            },
            SyncProgress::Backoff {
                unit: unit.clone(),
                retry_after_ms: 2_000,
                attempt: 1,
            },
            SyncProgress::UnitCompleted {
                unit: unit.clone(),
                upserted: 130,
            },
            SyncProgress::UnitFailed {
                unit,
                error: "rate limited".to_string(),
            },
            SyncProgress::PhaseStarted {
                phase: "pull_requests".to_string(),
                units: 5,
            },
            SyncProgress::PhaseCompleted {
                phase: "pull_requests".to_string(),
                successful: 4,
                failed: 1,
            },
            SyncProgress::FullSyncCompleted {
                successful: 9,
                failed: 1,
            },
            SyncProgress::Warning {
                message: "stored cursor was not a page number".to_string(),
            },
        ];

        let debug = format!("{events:?}");
        assert!(debug.contains("RecordSkipped"));
        assert!(debug.contains("FullSyncCompleted"));
    }
}
