//! Replay queue for webhook events that arrived before their parent row.
//!
//! A review or comment delivery can outrun the sync that would have mirrored
//! its pull request. [`crate::webhook`] parks such events here; a periodic
//! [`process_pending`] pass replays them with exponential backoff until the
//! parent appears or the attempt budget runs out. Exhausted rows move to
//! [`PendingStatus::Failed`], where an operator can inspect and requeue them.
//!
//! Replays apply the same idempotent upserts as live ingestion, so two
//! concurrent drain passes picking up the same row do no harm.

use std::time::Duration;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::prelude::*;
use crate::store::{Result as StoreResult, StoreError};
use crate::webhook::{Applied, IngestError, WebhookEvent, apply_event};

/// Replay schedule for parked events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before a row is marked failed.
    pub max_attempts: i32,
    /// Delay before the first replay. Doubles with each failed attempt.
    pub base_delay: Duration,
    /// Ceiling on the doubling schedule.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(3600),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given number of failed attempts:
    /// `base_delay * 2^(attempts - 1)`, capped at `max_delay`.
    pub fn backoff_delay(&self, attempts: i32) -> Duration {
        let exponent = attempts.saturating_sub(1).clamp(0, 20) as u32;
        let delay = self
            .base_delay
            .saturating_mul(2_u32.saturating_pow(exponent));
        delay.min(self.max_delay)
    }
}

/// Counters from one [`process_pending`] pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingStats {
    /// Rows whose event applied (or turned out to be a no-op) and were
    /// removed from the queue.
    pub applied: usize,
    /// Rows whose parent is still missing, rescheduled for a later pass.
    pub rescheduled: usize,
    /// Rows that exhausted their attempt budget this pass.
    pub failed: usize,
}

/// Park a webhook event until its parent resource is mirrored.
///
/// The delivery ID is unique in the queue: racing duplicates of the same
/// delivery collapse to one row. Returns whether a new row was created.
pub async fn park_event(
    db: &DatabaseConnection,
    user_id: &str,
    delivery_id: &str,
    event: &str,
    payload: serde_json::Value,
    reason: &str,
    policy: &RetryPolicy,
) -> StoreResult<bool> {
    let now = Utc::now().fixed_offset();
    let model = PendingEventActiveModel {
        id: Set(Uuid::new_v4()),
        delivery_id: Set(delivery_id.to_string()),
        event: Set(event.to_string()),
        user_id: Set(user_id.to_string()),
        payload: Set(payload),
        status: Set(PendingStatus::Pending),
        attempts: Set(0),
        next_attempt_at: Set(now + to_chrono(policy.base_delay)),
        last_error: Set(Some(reason.to_string())),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let rows = PendingEvent::insert(model)
        .on_conflict(
            OnConflict::column(PendingEventColumn::DeliveryId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(rows > 0)
}

/// Replay every due pending event once.
///
/// Rows are drained oldest schedule first. An event that applies (or no
/// longer needs to) leaves the queue; one whose parent is still missing is
/// rescheduled with backoff, or marked failed once `policy.max_attempts`
/// is spent.
///
/// # Errors
/// Returns `StoreError::Database` wrapped in [`IngestError::Store`] when the
/// queue itself cannot be read or written. Per-row replay problems are
/// recorded on the row instead of aborting the pass.
pub async fn process_pending(
    db: &DatabaseConnection,
    policy: &RetryPolicy,
) -> Result<PendingStats, IngestError> {
    let now = Utc::now().fixed_offset();
    let due = PendingEvent::find()
        .filter(PendingEventColumn::Status.eq(PendingStatus::Pending))
        .filter(PendingEventColumn::NextAttemptAt.lte(now))
        .order_by_asc(PendingEventColumn::NextAttemptAt)
        .all(db)
        .await
        .map_err(StoreError::from)?;

    let mut stats = PendingStats::default();
    for row in due {
        match replay_event(db, &row).await {
            Ok(Applied::Done | Applied::Nothing) => {
                PendingEvent::delete_by_id(row.id)
                    .exec(db)
                    .await
                    .map_err(StoreError::from)?;
                tracing::debug!(
                    "pending event {} ({}) applied after {} retries",
                    row.delivery_id,
                    row.event,
                    row.attempts
                );
                stats.applied += 1;
            }
            Ok(Applied::ParentMissing(reason)) => {
                reschedule_or_fail(db, &row, policy, &reason, &mut stats).await?;
            }
            Err(IngestError::Store(StoreError::Database(err))) => {
                return Err(StoreError::Database(err).into());
            }
            Err(err) => {
                reschedule_or_fail(db, &row, policy, &err.to_string(), &mut stats).await?;
            }
        }
    }
    Ok(stats)
}

async fn replay_event(
    db: &DatabaseConnection,
    row: &PendingEventModel,
) -> Result<Applied, IngestError> {
    let event = WebhookEvent::parse(&row.event, &row.payload)?;
    apply_event(db, &row.user_id, &event)
        .await
        .map_err(Into::into)
}

async fn reschedule_or_fail(
    db: &DatabaseConnection,
    row: &PendingEventModel,
    policy: &RetryPolicy,
    reason: &str,
    stats: &mut PendingStats,
) -> StoreResult<()> {
    let attempts = row.attempts + 1;
    let now = Utc::now().fixed_offset();
    let mut update = PendingEventActiveModel {
        attempts: Set(attempts),
        last_error: Set(Some(reason.to_string())),
        updated_at: Set(now),
        ..Default::default()
    };

    if attempts >= policy.max_attempts {
        update.status = Set(PendingStatus::Failed);
        tracing::warn!(
            "pending event {} ({}) exhausted {} attempts: {reason}",
            row.delivery_id,
            row.event,
            policy.max_attempts
        );
        stats.failed += 1;
    } else {
        update.next_attempt_at = Set(now + to_chrono(policy.backoff_delay(attempts)));
        stats.rescheduled += 1;
    }

    PendingEvent::update_many()
        .filter(PendingEventColumn::Id.eq(row.id))
        .set(update)
        .exec(db)
        .await?;
    Ok(())
}

/// Pending rows that ran out of replay attempts, oldest first. Scoped to
/// one tenant when `user_id` is given.
pub async fn list_failed(
    db: &DatabaseConnection,
    user_id: Option<&str>,
) -> StoreResult<Vec<PendingEventModel>> {
    let mut query = PendingEvent::find().filter(PendingEventColumn::Status.eq(PendingStatus::Failed));
    if let Some(user_id) = user_id {
        query = query.filter(PendingEventColumn::UserId.eq(user_id));
    }
    query
        .order_by_asc(PendingEventColumn::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Put a failed row back in the replay rotation with a fresh attempt
/// budget, due immediately.
///
/// # Errors
/// `StoreError::NotFound` when no pending row has this ID.
pub async fn requeue(db: &DatabaseConnection, id: Uuid) -> StoreResult<()> {
    let now = Utc::now().fixed_offset();
    let result = PendingEvent::update_many()
        .filter(PendingEventColumn::Id.eq(id))
        .set(PendingEventActiveModel {
            status: Set(PendingStatus::Pending),
            attempts: Set(0),
            next_attempt_at: Set(now),
            last_error: Set(None),
            updated_at: Set(now),
            ..Default::default()
        })
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(StoreError::not_found_by_id("pending event", id));
    }
    Ok(())
}

fn to_chrono(delay: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(delay.as_millis() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn ok_exec() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn parked_row(attempts: i32) -> PendingEventModel {
        let now = Utc::now().fixed_offset();
        PendingEventModel {
            id: Uuid::new_v4(),
            delivery_id: "dlv-9".to_string(),
            event: "pull_request_review".to_string(),
            user_id: "user-1".to_string(),
            payload: json!({
                "action": "submitted",
                "review": {
                    "id": 555,
                    "user": {"id": 2, "login": "octocat"},
                    "state": "approved",
                    "body": null,
                    "submitted_at": null,
                },
                "pull_request": {"id": 9001, "number": 7},
                "repository": {
                    "id": 12345,
                    "name": "api",
                    "owner": {"id": 1, "login": "acme"},
                    "description": null,
                    "default_branch": "main",
                    "html_url": null,
                    "pushed_at": null,
                    "created_at": null,
                    "updated_at": null,
                },
            }),
            status: PendingStatus::Pending,
            attempts,
            next_attempt_at: now - chrono::Duration::seconds(1),
            last_error: Some("pull request acme/api#7 is not mirrored for user-1".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(30));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(60));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(120));
        assert_eq!(policy.backoff_delay(12), Duration::from_secs(3600));

        let tight = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(25),
        };
        assert_eq!(tight.backoff_delay(1), Duration::from_secs(10));
        assert_eq!(tight.backoff_delay(2), Duration::from_secs(20));
        assert_eq!(tight.backoff_delay(3), Duration::from_secs(25));
    }

    #[test]
    fn backoff_never_overflows_on_large_attempt_counts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(i32::MAX), policy.max_delay);
        assert_eq!(policy.backoff_delay(0), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn drain_applies_a_row_whose_parent_appeared() {
        // Queue read finds one due row; the replay finds the pull request
        // and upserts the review; the row is deleted.
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![parked_row(2)]])
            .append_query_results([vec![pr_fixture()]])
            .append_exec_results([ok_exec(), ok_exec()])
            .into_connection();

        let stats = process_pending(&db, &RetryPolicy::default()).await.unwrap();
        assert_eq!(
            stats,
            PendingStats {
                applied: 1,
                rescheduled: 0,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn drain_reschedules_when_the_parent_is_still_missing() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![parked_row(1)]])
            .append_query_results([Vec::<PullRequestModel>::new()])
            .append_exec_results([ok_exec()])
            .into_connection();

        let stats = process_pending(&db, &RetryPolicy::default()).await.unwrap();
        assert_eq!(
            stats,
            PendingStats {
                applied: 0,
                rescheduled: 1,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn drain_fails_a_row_that_spent_its_budget() {
        // attempts 4 -> 5 hits the default budget.
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![parked_row(4)]])
            .append_query_results([Vec::<PullRequestModel>::new()])
            .append_exec_results([ok_exec()])
            .into_connection();

        let stats = process_pending(&db, &RetryPolicy::default()).await.unwrap();
        assert_eq!(
            stats,
            PendingStats {
                applied: 0,
                rescheduled: 0,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn requeue_of_unknown_row_reports_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = requeue(&db, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    fn pr_fixture() -> PullRequestModel {
        let now = Utc::now().fixed_offset();
        PullRequestModel {
            id: crate::ident::pull_request_id("user-1", "acme", "api", 7),
            repository_id: crate::ident::repository_id("user-1", "acme", "api"),
            user_id: "user-1".to_string(),
            number: 7,
            remote_id: 9001,
            title: "Add pagination".to_string(),
            body: None,
            state: "open".to_string(),
            draft: false,
            merged: false,
            mergeable: None,
            locked: false,
            author_login: "octocat".to_string(),
            base_ref: "main".to_string(),
            head_ref: "feature".to_string(),
            head_sha: "bbb222".to_string(),
            labels: json!([]),
            requested_reviewers: json!([]),
            viewed_files: json!([]),
            created_at: None,
            updated_at: None,
            closed_at: None,
            merged_at: None,
            synced_at: now,
        }
    }
}
