//! WebhookDelivery entity - processed delivery IDs for webhook dedup.
//!
//! The host retries deliveries it believes failed, so the same delivery can
//! arrive more than once. A row here means the delivery was already handled
//! and later copies should be acknowledged without reprocessing.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// WebhookDelivery model - one row per processed delivery.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "webhook_deliveries")]
pub struct Model {
    /// The host's delivery GUID, taken from the delivery header.
    #[sea_orm(primary_key, auto_increment = false)]
    pub delivery_id: String,

    /// Event name the delivery carried, e.g. `pull_request`.
    pub event: String,

    /// When the delivery was processed. Rows older than the retention
    /// window are pruned; the host does not retry that far back.
    pub received_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
