//! Status enum for the sync state machine.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a sync state row.
///
/// Rows start `Idle`, move to `Syncing` while exactly one worker holds the
/// claim, and settle in `Completed`, `Error`, or `AuthInvalid`. Every status
/// except `Syncing` can be claimed again.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum SyncStatus {
    #[sea_orm(string_value = "idle")]
    #[default]
    Idle,
    #[sea_orm(string_value = "syncing")]
    Syncing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "error")]
    Error,
    /// The stored credential was rejected by the host. Cleared only by
    /// reconnecting the credential, not by retries.
    #[sea_orm(string_value = "auth_invalid")]
    AuthInvalid,
}

impl SyncStatus {
    /// Whether a worker currently holds this row.
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, SyncStatus::Syncing)
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Completed => "completed",
            SyncStatus::Error => "error",
            SyncStatus::AuthInvalid => "auth_invalid",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(SyncStatus::Idle),
            "syncing" => Ok(SyncStatus::Syncing),
            "completed" => Ok(SyncStatus::Completed),
            "error" => Ok(SyncStatus::Error),
            "auth_invalid" => Ok(SyncStatus::AuthInvalid),
            _ => Err(format!("unknown sync status: {s}")),
        }
    }
}
