//! Repository entity - mirrored repositories, scoped per user.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Repository model - one row per (user, owner, name).
///
/// The same remote repository mirrored for two users yields two rows with
/// different deterministic IDs; tenants never share rows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    /// Deterministic UUID derived from (user, owner, name); see [`crate::ident`].
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tenant key.
    pub user_id: String,
    /// Numeric ID assigned by the host.
    pub remote_id: i64,

    /// Owner login (user or organization).
    pub owner: String,
    /// Repository name.
    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(default_value = false)]
    pub private: bool,
    #[sea_orm(default_value = false)]
    pub fork: bool,
    #[sea_orm(default_value = false)]
    pub archived: bool,
    #[sea_orm(default_value = "main")]
    pub default_branch: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub html_url: Option<String>,

    /// When code was last pushed on the host.
    pub pushed_at: Option<DateTimeWithTimeZone>,
    /// When the repository was created on the host.
    pub created_at: Option<DateTimeWithTimeZone>,
    /// When the repository was last updated on the host.
    pub updated_at: Option<DateTimeWithTimeZone>,
    /// When this row was last written by sync or webhook ingest.
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pull_request::Entity")]
    PullRequest,
    #[sea_orm(has_many = "super::issue::Entity")]
    Issue,
    #[sea_orm(has_many = "super::check_run::Entity")]
    CheckRun,
}

impl Related<super::pull_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PullRequest.def()
    }
}

impl Related<super::issue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Issue.def()
    }
}

impl Related<super::check_run::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckRun.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Full name in `owner/name` form.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}
