//! GitHub API error taxonomy.
//!
//! Every failed remote call is classified into one of these variants. The
//! distinction that matters most is [`HostError::Auth`]: it is the only
//! variant that invalidates the stored credential and halts further sync for
//! that user, so it must never be conflated with a retryable failure.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::http::{HttpHeaders, header_get};

/// Errors from remote host calls.
#[derive(Debug, Error)]
pub enum HostError {
    /// The credential was rejected. Halts sync for this user until the
    /// credential is reconnected; never retried.
    #[error("authentication rejected by host")]
    Auth,

    /// The API quota is exhausted. Back off until `reset_at` or for
    /// `retry_after` seconds, whichever the host provided.
    #[error("rate limited{}", reset_suffix(.reset_at))]
    RateLimited {
        reset_at: Option<DateTime<Utc>>,
        retry_after: Option<u64>,
    },

    /// The remote resource is gone or invisible to this credential.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// The host rejected a write for business-rule reasons; the message is
    /// surfaced verbatim to the caller.
    #[error("unprocessable: {message}")]
    Unprocessable { message: String },

    /// Network failure or host 5xx; retryable with the cursor intact.
    #[error("transient error: {message}")]
    Transient { message: String },

    /// Anything else, kept with enough context to diagnose.
    #[error("unexpected host response (status {status}): {message}")]
    Unknown { status: u16, message: String },
}

fn reset_suffix(reset_at: &Option<DateTime<Utc>>) -> String {
    match reset_at {
        Some(at) => format!(", resets at {at}"),
        None => String::new(),
    }
}

impl HostError {
    /// Whether waiting and retrying the same call can succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HostError::RateLimited { .. } | HostError::Transient { .. }
        )
    }

    /// Whether this failure invalidates the stored credential.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, HostError::Auth)
    }

    pub(crate) fn transient(message: impl Into<String>) -> Self {
        HostError::Transient {
            message: message.into(),
        }
    }

    pub(crate) fn decode(context: &str, err: serde_json::Error) -> Self {
        HostError::Unknown {
            status: 0,
            message: format!("failed to decode {context}: {err}"),
        }
    }
}

/// Classify a non-2xx/304 response.
///
/// A 403 is rate limiting only when the headers say so (`Retry-After`
/// present or `x-ratelimit-remaining` at zero); otherwise it is an
/// authorization failure. A 429 is always rate limiting.
pub(crate) fn classify_response(status: u16, headers: &HttpHeaders, body: &[u8]) -> HostError {
    let message = || String::from_utf8_lossy(body).into_owned();

    match status {
        401 => HostError::Auth,
        403 if !rate_limit_exhausted(headers) => HostError::Auth,
        403 | 429 => HostError::RateLimited {
            reset_at: parse_reset_header(headers),
            retry_after: parse_retry_after(headers),
        },
        404 => HostError::NotFound {
            resource: message(),
        },
        // 405 and 409 are GitHub's merge rejections ("not mergeable",
        // "head branch was modified"); same class as a 422.
        405 | 409 | 422 => HostError::Unprocessable { message: message() },
        500..=599 => HostError::Transient {
            message: format!("host returned {status}"),
        },
        _ => HostError::Unknown {
            status,
            message: message(),
        },
    }
}

fn rate_limit_exhausted(headers: &HttpHeaders) -> bool {
    if header_get(headers, "retry-after").is_some() {
        return true;
    }
    header_get(headers, "x-ratelimit-remaining")
        .and_then(|v| v.parse::<i64>().ok())
        .is_some_and(|remaining| remaining == 0)
}

fn parse_retry_after(headers: &HttpHeaders) -> Option<u64> {
    header_get(headers, "retry-after")?.parse().ok()
}

fn parse_reset_header(headers: &HttpHeaders) -> Option<DateTime<Utc>> {
    let epoch = header_get(headers, "x-ratelimit-reset")?.parse::<i64>().ok()?;
    DateTime::from_timestamp(epoch, 0)
}

/// Short single-line error message for log lines and progress events.
#[must_use]
pub fn short_error_message(err: &HostError) -> String {
    match err {
        HostError::Auth => "auth rejected".to_string(),
        HostError::RateLimited { retry_after, .. } => match retry_after {
            Some(secs) => format!("rate limited (retry after {secs}s)"),
            None => "rate limited".to_string(),
        },
        HostError::NotFound { .. } => "not found".to_string(),
        HostError::Unprocessable { .. } => "unprocessable".to_string(),
        HostError::Transient { message } => format!("transient: {message}"),
        HostError::Unknown { status, .. } => format!("unexpected status {status}"),
    }
}
