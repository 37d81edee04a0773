//! Push-based ingestion of signed host webhooks.
//!
//! Where [`crate::sync`] pulls, this module is pushed to: the host delivers
//! signed event payloads and the pipeline turns each one into the same
//! deterministic-ID upsert a pull sync would have made. Both paths can run
//! concurrently against the same rows.
//!
//! # Module Structure
//!
//! - [`signature`] - HMAC-SHA256 verification of the raw body
//! - [`event`] - Typed payloads and dispatch on the event header
//! - [`ingest`] - The verify, dedup, resolve, upsert pipeline
//! - [`error`] - The [`IngestError`] taxonomy
//!
//! # Usage
//!
//! ```ignore
//! use forgemirror::webhook::{RawDelivery, ingest_webhook};
//!
//! let outcome = ingest_webhook(&db, secret, &retry, user_id, RawDelivery {
//!     delivery_id, event, signature, body,
//! }).await?;
//! ```
//!
//! Events whose parent row is not mirrored yet are parked in
//! [`crate::pending`] and replayed from there.

mod error;
mod event;
mod ingest;
mod signature;

pub use error::IngestError;
pub use event::{
    CheckRunEvent, EventPullRequestRef, IssueCommentEvent, IssuesEvent, PullRequestEvent,
    ReviewCommentEvent, ReviewEvent, WebhookEvent,
};
pub use ingest::{
    DELIVERY_RETENTION, IngestOutcome, RawDelivery, ingest_webhook, prune_deliveries,
};
pub use signature::{SignatureError, sign_body, verify_signature};

pub(crate) use ingest::{Applied, apply_event};
