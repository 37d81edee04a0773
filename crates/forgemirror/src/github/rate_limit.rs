//! Request pacing and rate-limit header tracking.

use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::http::{HttpHeaders, header_get};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// GitHub allows 5000 requests/hour for authenticated users. 10/sec keeps
/// bursts well inside the secondary rate limits.
pub const DEFAULT_RPS: u32 = 10;

/// Quota state reported by the host on every response.
///
/// Ephemeral, never persisted: callers use it to decide whether a multi-step
/// sync should continue, and endpoints surface it to their clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    /// Total request quota in the current window.
    pub limit: usize,
    /// Requests left in the current window.
    pub remaining: usize,
    /// When the window resets.
    pub reset_at: DateTime<Utc>,
    /// Seconds to wait, when the host sent `Retry-After`.
    pub retry_after: Option<u64>,
}

impl RateLimitSnapshot {
    /// Whether the quota is spent.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Parse the `x-ratelimit-*` response headers. Returns `None` when the
    /// response carries no rate-limit information.
    #[must_use]
    pub fn from_headers(headers: &HttpHeaders) -> Option<Self> {
        let limit = header_get(headers, "x-ratelimit-limit")?
            .parse::<usize>()
            .ok()?;
        let remaining = header_get(headers, "x-ratelimit-remaining")?
            .parse::<usize>()
            .ok()?;
        let reset_epoch = header_get(headers, "x-ratelimit-reset")?
            .parse::<i64>()
            .ok()?;
        let reset_at = DateTime::from_timestamp(reset_epoch, 0).unwrap_or_else(Utc::now);
        let retry_after = header_get(headers, "retry-after").and_then(|v| v.parse().ok());

        Some(Self {
            limit,
            remaining,
            reset_at,
            retry_after,
        })
    }
}

/// Proactive request pacer backed by the governor crate.
///
/// The host's quota headers are reactive; this limiter keeps the client from
/// approaching them in the first place.
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a limiter allowing `requests_per_second` requests. Zero is
    /// treated as one.
    #[must_use]
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second)
            .unwrap_or_else(|| NonZeroU32::new(1).expect("1 is non-zero"));
        Self {
            inner: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        }
    }

    /// Wait until the next request is allowed.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

impl Default for ApiRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RPS)
    }
}
