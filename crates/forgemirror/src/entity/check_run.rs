//! CheckRun entity - CI check runs keyed by commit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// CheckRun model - one row per (user, remote check run ID).
///
/// Attached to the repository rather than a pull request: check runs are
/// keyed by commit SHA, and consumers join them to PRs via `head_sha`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "check_runs")]
pub struct Model {
    /// Deterministic UUID derived from (user, remote ID).
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning repository row.
    pub repository_id: Uuid,
    /// Tenant key.
    pub user_id: String,
    /// Numeric ID assigned by the host.
    pub remote_id: i64,

    /// Commit the check ran against.
    pub head_sha: String,
    /// Check name, e.g. `build` or `lint`.
    pub name: String,
    /// Host status string: `queued`, `in_progress`, or `completed`.
    pub status: String,
    /// Host conclusion string once completed, e.g. `success` or `failure`.
    pub conclusion: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub details_url: Option<String>,

    pub started_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    /// When this row was last written by sync or webhook ingest.
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::RepositoryId",
        to = "super::repository::Column::Id"
    )]
    Repository,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}
