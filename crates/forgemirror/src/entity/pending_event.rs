//! PendingEvent entity - webhook events parked until their parent row exists.
//!
//! A review webhook can arrive before the pull request it belongs to has been
//! synced. Instead of dropping it, the raw payload is parked here and
//! replayed with backoff; once the parent row appears the replay succeeds.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::pending_status::PendingStatus;

/// PendingEvent model - one deferred webhook delivery.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pending_events")]
pub struct Model {
    /// Random UUID; deferred events have no natural deterministic key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Delivery GUID of the original webhook. Unique, so a redelivered
    /// webhook cannot park the same event twice.
    pub delivery_id: String,
    /// Event name the delivery carried.
    pub event: String,
    /// Tenant the delivery was addressed to.
    pub user_id: String,
    /// The full webhook payload, replayed verbatim.
    #[sea_orm(column_type = "Json")]
    pub payload: serde_json::Value,

    /// Replay lifecycle.
    pub status: PendingStatus,
    /// Replay attempts made so far.
    #[sea_orm(default_value = 0)]
    pub attempts: i32,
    /// Earliest time of the next replay attempt.
    pub next_attempt_at: DateTimeWithTimeZone,
    /// Why the most recent replay attempt still could not apply the event.
    #[sea_orm(column_type = "Text", nullable)]
    pub last_error: Option<String>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this event is eligible for a replay attempt at `now`.
    pub fn is_due(&self, now: DateTimeWithTimeZone) -> bool {
        self.status == PendingStatus::Pending && self.next_attempt_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn make_test_model(status: PendingStatus, next_in: Duration) -> Model {
        let now = Utc::now().fixed_offset();
        Model {
            id: Uuid::new_v4(),
            delivery_id: "delivery-1".to_string(),
            event: "pull_request_review".to_string(),
            user_id: "user-1".to_string(),
            payload: serde_json::json!({}),
            status,
            attempts: 1,
            next_attempt_at: now + next_in,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn due_when_pending_and_schedule_elapsed() {
        let now = Utc::now().fixed_offset();
        assert!(make_test_model(PendingStatus::Pending, Duration::seconds(-5)).is_due(now));
    }

    #[test]
    fn not_due_before_schedule_or_after_failure() {
        let now = Utc::now().fixed_offset();
        assert!(!make_test_model(PendingStatus::Pending, Duration::seconds(60)).is_due(now));
        assert!(!make_test_model(PendingStatus::Failed, Duration::seconds(-5)).is_due(now));
    }
}
