//! Error taxonomy for webhook ingestion.

use thiserror::Error;

use super::signature::SignatureError;
use crate::store::StoreError;

/// Why a delivery could not be ingested.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Authenticity check failed. The body was never parsed.
    #[error("signature verification failed: {0}")]
    Signature(#[from] SignatureError),

    /// The `X-GitHub-Event` header names an event this mirror does not handle.
    #[error("unsupported event type {event:?}")]
    UnsupportedEvent { event: String },

    /// The body is not valid JSON, or does not have the shape the event
    /// requires. Payloads are rejected rather than coerced.
    #[error("malformed {event} payload: {source}")]
    MalformedPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    /// The local store rejected the resulting mutation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    pub(crate) fn malformed(event: &str, source: serde_json::Error) -> Self {
        Self::MalformedPayload {
            event: event.to_string(),
            source,
        }
    }

    /// True when the sender is at fault and a retry of the same request
    /// cannot succeed. Store errors are this mirror's problem instead.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Signature(_) | Self::UnsupportedEvent { .. } | Self::MalformedPayload { .. }
        )
    }
}
