//! Status enum for deferred webhook events.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a deferred webhook event.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum PendingStatus {
    /// Waiting for its next replay attempt.
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    /// Replay attempts exhausted; kept for inspection and manual requeue.
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl std::fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PendingStatus::Pending => "pending",
            PendingStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}
