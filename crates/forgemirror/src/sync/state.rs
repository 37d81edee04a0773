//! Sync-state row operations.
//!
//! Each sync unit owns one row keyed by a deterministic ID over
//! (kind, user, optional ref). The row carries the state machine
//! idle -> syncing -> {completed | error | auth_invalid} plus the cursor and
//! ETag the next run resumes from. The transition to `syncing` is a single
//! conditional UPDATE, which makes the row a cross-process claim: at most one
//! worker can hold a unit at a time.

use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::prelude::{
    ResourceKind, SyncState, SyncStateActiveModel, SyncStateColumn, SyncStateModel, SyncStatus,
};
use crate::github::{GitHubAuthUser, HostApi};
use crate::ident;
use crate::store::{StoreError, insert_if_absent};

use super::error::{Result, SyncError};

/// Outcome of a claim attempt on a sync state row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginSync {
    /// The row moved to `syncing`; the caller owns the unit.
    Claimed,
    /// Another worker holds the row; the caller must back off.
    AlreadyRunning,
}

/// Find the state row for a sync unit, creating an idle one if absent.
///
/// Concurrent callers converge: the insert is on-conflict-do-nothing on the
/// deterministic ID, and every caller reselects the same row afterwards.
pub async fn fetch_or_create_sync_state(
    db: &DatabaseConnection,
    kind: ResourceKind,
    user_id: &str,
    resource_ref: Option<&str>,
) -> Result<SyncStateModel> {
    let id = ident::sync_state_id(kind.as_str(), user_id, resource_ref);
    let now = Utc::now().fixed_offset();

    let fresh = SyncStateActiveModel {
        id: Set(id),
        resource_kind: Set(kind),
        user_id: Set(user_id.to_string()),
        resource_ref: Set(resource_ref.map(str::to_string)),
        status: Set(SyncStatus::Idle),
        progress: Set(serde_json::json!({})),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    insert_if_absent(db, fresh).await?;

    SyncState::find_by_id(id)
        .one(db)
        .await
        .map_err(StoreError::from)?
        .ok_or_else(|| StoreError::not_found_by_id("sync state", id).into())
}

/// Try to move a state row to `syncing`.
///
/// The UPDATE is guarded on `status <> 'syncing'`, so exactly one of any
/// number of concurrent callers observes an affected row and wins the claim.
pub async fn try_begin_sync(db: &DatabaseConnection, id: Uuid) -> Result<BeginSync> {
    let result = SyncState::update_many()
        .filter(SyncStateColumn::Id.eq(id))
        .filter(SyncStateColumn::Status.ne(SyncStatus::Syncing))
        .set(SyncStateActiveModel {
            status: Set(SyncStatus::Syncing),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        })
        .exec(db)
        .await
        .map_err(StoreError::from)?;

    if result.rows_affected == 0 {
        tracing::debug!("sync state {id} is already claimed");
        Ok(BeginSync::AlreadyRunning)
    } else {
        Ok(BeginSync::Claimed)
    }
}

/// Checkpoint a claimed row after a page of work.
///
/// `cursor` replaces the stored resume point (`None` clears it, meaning the
/// next run starts the collection over); `progress` replaces the progress
/// document when given.
pub async fn update_sync_progress(
    db: &DatabaseConnection,
    id: Uuid,
    cursor: Option<String>,
    progress: Option<serde_json::Value>,
) -> Result<()> {
    let mut update = SyncStateActiveModel {
        last_cursor: Set(cursor),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };
    if let Some(progress) = progress {
        update.progress = Set(progress);
    }

    apply_update(db, id, update).await
}

/// Release a claimed row as `completed`.
///
/// Stores `etag` as the collection validator for the next run, clears the
/// cursor (the collection was fully paged) and the error, and stamps
/// `last_synced_at`.
pub async fn mark_sync_completed(
    db: &DatabaseConnection,
    id: Uuid,
    etag: Option<String>,
) -> Result<()> {
    let now = Utc::now().fixed_offset();
    let update = SyncStateActiveModel {
        status: Set(SyncStatus::Completed),
        last_cursor: Set(None),
        last_etag: Set(etag),
        last_error: Set(None),
        last_synced_at: Set(Some(now)),
        updated_at: Set(now),
        ..Default::default()
    };

    apply_update(db, id, update).await
}

/// Release a claimed row as `error`, keeping cursor and ETag for resumption.
pub async fn mark_sync_error(db: &DatabaseConnection, id: Uuid, message: &str) -> Result<()> {
    let update = SyncStateActiveModel {
        status: Set(SyncStatus::Error),
        last_error: Set(Some(message.to_string())),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };

    apply_update(db, id, update).await
}

/// Release a claimed row as `auth_invalid`, keeping cursor and ETag.
pub async fn mark_sync_auth_invalid(
    db: &DatabaseConnection,
    id: Uuid,
    message: &str,
) -> Result<()> {
    let update = SyncStateActiveModel {
        status: Set(SyncStatus::AuthInvalid),
        last_error: Set(Some(message.to_string())),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };

    apply_update(db, id, update).await
}

/// Return a row to `idle`, clearing error and progress but keeping cursor
/// and ETag so the next run resumes where the last one stopped.
///
/// Also clears a stale `syncing` claim left behind by a crashed worker.
pub async fn reset_sync_state(db: &DatabaseConnection, id: Uuid) -> Result<SyncStateModel> {
    let update = SyncStateActiveModel {
        status: Set(SyncStatus::Idle),
        last_error: Set(None),
        progress: Set(serde_json::json!({})),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };
    apply_update(db, id, update).await?;

    SyncState::find_by_id(id)
        .one(db)
        .await
        .map_err(StoreError::from)?
        .ok_or_else(|| StoreError::not_found_by_id("sync state", id).into())
}

/// All sync state rows of one user, ordered by kind then ref.
pub async fn list_sync_states(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<SyncStateModel>> {
    SyncState::find()
        .filter(SyncStateColumn::UserId.eq(user_id))
        .order_by_asc(SyncStateColumn::ResourceKind)
        .order_by_asc(SyncStateColumn::ResourceRef)
        .all(db)
        .await
        .map_err(StoreError::from)
        .map_err(Into::into)
}

/// Whether the user's credential row is `auth_invalid`.
///
/// A missing row means the credential was never flagged, so syncs proceed.
pub async fn credential_blocked(db: &DatabaseConnection, user_id: &str) -> Result<bool> {
    let id = ident::sync_state_id(ResourceKind::Credential.as_str(), user_id, None);
    let row = SyncState::find_by_id(id)
        .one(db)
        .await
        .map_err(StoreError::from)?;
    Ok(row.is_some_and(|r| r.status == SyncStatus::AuthInvalid))
}

/// Flag the user's credential as rejected by the host.
///
/// Every subsequent sync for this user short-circuits until
/// [`reconnect_credential`] clears the flag.
pub async fn mark_credential_invalid(
    db: &DatabaseConnection,
    user_id: &str,
    message: &str,
) -> Result<()> {
    tracing::warn!("credential for {user_id} rejected by the host: {message}");
    let row = fetch_or_create_sync_state(db, ResourceKind::Credential, user_id, None).await?;
    mark_sync_auth_invalid(db, row.id, message).await
}

/// Validate the user's credential against the host and, on success, return
/// every `auth_invalid` row of the user to `idle`.
pub async fn reconnect_credential(
    db: &DatabaseConnection,
    host: &dyn HostApi,
    user_id: &str,
) -> Result<GitHubAuthUser> {
    let account = host
        .fetch_authenticated_user()
        .await
        .map_err(|e| SyncError::host(format!("credential/{user_id}"), e))?;

    SyncState::update_many()
        .filter(SyncStateColumn::UserId.eq(user_id))
        .filter(SyncStateColumn::Status.eq(SyncStatus::AuthInvalid))
        .set(SyncStateActiveModel {
            status: Set(SyncStatus::Idle),
            last_error: Set(None),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        })
        .exec(db)
        .await
        .map_err(StoreError::from)?;

    tracing::info!("credential for {user_id} reconnected as {}", account.login);
    Ok(account)
}

/// Apply a partial update to one row by ID, failing if the row is gone.
async fn apply_update(
    db: &DatabaseConnection,
    id: Uuid,
    update: SyncStateActiveModel,
) -> Result<()> {
    let result = SyncState::update_many()
        .filter(SyncStateColumn::Id.eq(id))
        .set(update)
        .exec(db)
        .await
        .map_err(StoreError::from)?;

    if result.rows_affected == 0 {
        return Err(StoreError::not_found_by_id("sync state", id).into());
    }
    Ok(())
}
