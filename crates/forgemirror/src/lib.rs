//! Forgemirror - a local mirror of GitHub review state.
//!
//! Repositories, pull requests, issues, reviews, comments, and check runs
//! are mirrored into a local database by two cooperating paths: an
//! incremental pull sync driven by cursors and ETags, and push ingestion of
//! HMAC-signed webhooks. Every mirrored row is keyed by a deterministic
//! UUID derived from its natural key, so both paths converge on the same
//! row no matter which one writes first.
//!
//! # Features
//!
//! - `sqlite` (default) - Bundled SQLite driver.
//! - `postgres` - Postgres driver for deployments that outgrow SQLite.
//! - `migrate` (default) - Schema migrations and [`connect_and_migrate`].
//!
//! # Example
//!
//! ```ignore
//! use forgemirror::connect_and_migrate;
//! use forgemirror::github::GitHubClient;
//! use forgemirror::sync::{SyncOptions, sync_repositories};
//!
//! let db = connect_and_migrate("sqlite://mirror.db?mode=rwc").await?;
//! let host = GitHubClient::new("ghp_token", None)?;
//!
//! let outcome =
//!     sync_repositories(&db, &host, "user-1", &SyncOptions::default(), None).await?;
//! ```

pub mod db;
pub mod entity;
pub mod github;
pub mod http;
pub mod ident;
pub mod pending;
pub mod retry;
pub mod store;
pub mod sync;
pub mod webhook;

#[cfg(feature = "migrate")]
pub mod migration;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use github::{GitHubClient, HostApi, HostError};
pub use store::StoreError;
pub use sync::{SyncError, SyncOptions};
pub use webhook::{IngestError, IngestOutcome, RawDelivery, ingest_webhook};
