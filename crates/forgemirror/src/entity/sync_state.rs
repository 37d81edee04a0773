//! SyncState entity - one row per (resource kind, user, resource ref) sync unit.
//!
//! The row doubles as a mutex: the transition to `syncing` is a conditional
//! UPDATE, so at most one worker can hold a unit at a time even across
//! processes sharing the database.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::resource_kind::ResourceKind;
use crate::entity::sync_status::SyncStatus;

/// SyncState model - cursor, ETag, and status bookkeeping for one sync unit.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_states")]
pub struct Model {
    /// Deterministic UUID derived from (kind, user, ref); see [`crate::ident`].
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    // ─── Identity ────────────────────────────────────────────────────────────
    /// What this row tracks.
    pub resource_kind: ResourceKind,
    /// Tenant key. Every query against this table filters by it.
    pub user_id: String,
    /// Narrows the unit below the kind, e.g. `"owner/repo"` for per-repo
    /// kinds or `"owner/repo:main"` for a tree. `None` for account-wide units.
    pub resource_ref: Option<String>,

    // ─── State machine ───────────────────────────────────────────────────────
    /// Current lifecycle status.
    pub status: SyncStatus,

    // ─── Incremental fetch bookkeeping ───────────────────────────────────────
    /// Opaque resume point for the next incremental fetch. Advanced only
    /// after a page is durably stored; never cleared by a failure.
    #[sea_orm(column_type = "Text", nullable)]
    pub last_cursor: Option<String>,
    /// ETag from the most recent list response, replayed via If-None-Match.
    #[sea_orm(column_type = "Text", nullable)]
    pub last_etag: Option<String>,

    // ─── Outcome ─────────────────────────────────────────────────────────────
    /// Human-readable description of the most recent failure.
    #[sea_orm(column_type = "Text", nullable)]
    pub last_error: Option<String>,
    /// When a run last completed successfully.
    pub last_synced_at: Option<DateTimeWithTimeZone>,
    /// Operation-specific progress, e.g. the full sync phase ledger.
    #[sea_orm(column_type = "Json")]
    pub progress: serde_json::Value,

    // ─── Timestamps ──────────────────────────────────────────────────────────
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Compact identity label for log lines, e.g. `pull_request/user-1/acme/api`.
    pub fn unit_label(&self) -> String {
        match &self.resource_ref {
            Some(r) => format!("{}/{}/{}", self.resource_kind, self.user_id, r),
            None => format!("{}/{}", self.resource_kind, self.user_id),
        }
    }

    /// Whether a worker currently holds this unit.
    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }
}
