//! Retry utilities for host requests.
//!
//! Wraps backon's exponential backoff with the crate's retry policy:
//! rate-limited and transient host errors are retried, everything else
//! surfaces immediately.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::github::{HostError, short_error_message};
use crate::sync::{INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_TRANSIENT_RETRIES, SyncProgress};
use crate::sync::{ProgressCallback, emit};

/// Configuration for retry operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retry attempts.
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: MAX_TRANSIENT_RETRIES as usize,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a retry configuration with custom values.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// Build the default exponential backoff strategy for host requests.
#[must_use]
pub fn default_backoff() -> ExponentialBuilder {
    RetryConfig::default().into_backoff()
}

/// Execute a host request, retrying rate-limited and transient failures.
///
/// Authentication and validation errors are never retried: the former
/// drives the unit to `auth_invalid`, the latter cannot succeed on a
/// replay. Each backoff emits [`SyncProgress::Backoff`] tagged with the
/// unit label so callers can surface the wait.
pub async fn with_retry<T, F, Fut>(
    mut operation: F,
    config: &RetryConfig,
    unit: &str,
    on_progress: Option<&ProgressCallback>,
) -> Result<T, HostError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HostError>>,
{
    let unit_label = unit.to_string();

    // Track attempt number for progress reporting
    let attempt = AtomicU32::new(0);

    let retry_op = || {
        attempt.fetch_add(1, Ordering::SeqCst);
        operation()
    };

    retry_op
        .retry(config.clone().into_backoff())
        .notify(|err, dur| {
            let current_attempt = attempt.load(Ordering::SeqCst);
            emit(
                on_progress,
                SyncProgress::Backoff {
                    unit: unit_label.clone(),
                    retry_after_ms: dur.as_millis() as u64,
                    attempt: current_attempt,
                },
            );
            tracing::debug!(
                "retryable host error in {}, retrying in {:?} (attempt {}): {}",
                unit_label,
                dur,
                current_attempt,
                short_error_message(err)
            );
        })
        .when(HostError::is_retryable)
        .await
}
