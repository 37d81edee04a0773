//! Issue entity - mirrored issues.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Issue model - one row per (user, owner, repo, number).
///
/// The host's issues list also returns pull requests; those rows are kept
/// with `is_pull_request = true` so issue listings can exclude them.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "issues")]
pub struct Model {
    /// Deterministic UUID derived from (user, owner, repo, number).
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning repository row.
    pub repository_id: Uuid,
    /// Tenant key.
    pub user_id: String,
    /// Issue number within the repository.
    pub number: i32,
    /// Numeric ID assigned by the host.
    pub remote_id: i64,

    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub body: Option<String>,
    /// Host state string, `open` or `closed`.
    pub state: String,
    #[sea_orm(default_value = false)]
    pub locked: bool,
    /// Whether this number is actually a pull request on the host.
    #[sea_orm(default_value = false)]
    pub is_pull_request: bool,
    pub author_login: String,

    /// Label names (JSON array).
    #[sea_orm(column_type = "Json")]
    pub labels: serde_json::Value,
    /// Assignee logins (JSON array).
    #[sea_orm(column_type = "Json")]
    pub assignees: serde_json::Value,
    pub comments_count: Option<i32>,

    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub closed_at: Option<DateTimeWithTimeZone>,
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
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_open(&self) -> bool {
        self.state == "open"
    }
}
