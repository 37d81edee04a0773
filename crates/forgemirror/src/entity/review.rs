//! Review entity - pull request reviews.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review model - one row per (user, remote review ID).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    /// Deterministic UUID derived from (user, remote ID).
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Pull request this review belongs to.
    pub pull_request_id: Uuid,
    /// Tenant key.
    pub user_id: String,
    /// Numeric ID assigned by the host.
    pub remote_id: i64,

    pub author_login: String,
    /// Host review state, e.g. `APPROVED`, `CHANGES_REQUESTED`, `COMMENTED`.
    pub state: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub body: Option<String>,
    /// Commit the review was submitted against.
    pub commit_sha: Option<String>,

    pub submitted_at: Option<DateTimeWithTimeZone>,
    /// When this row was last written by sync or webhook ingest.
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pull_request::Entity",
        from = "Column::PullRequestId",
        to = "super::pull_request::Column::Id"
    )]
    PullRequest,
}

impl Related<super::pull_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PullRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
