//! PullRequest entity - mirrored pull requests.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// PullRequest model - one row per (user, owner, repo, number).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pull_requests")]
pub struct Model {
    /// Deterministic UUID derived from (user, owner, repo, number); the sync
    /// and webhook paths both compute it, so they converge on the same row.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    // ─── Identity ────────────────────────────────────────────────────────────
    /// Owning repository row.
    pub repository_id: Uuid,
    /// Tenant key, duplicated from the repository for single-table queries.
    pub user_id: String,
    /// PR number within the repository.
    pub number: i32,
    /// Numeric ID assigned by the host.
    pub remote_id: i64,

    // ─── Content ─────────────────────────────────────────────────────────────
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub body: Option<String>,
    /// Host state string, `open` or `closed`.
    pub state: String,
    #[sea_orm(default_value = false)]
    pub draft: bool,
    #[sea_orm(default_value = false)]
    pub merged: bool,
    /// Host's mergeability verdict; `None` while it is still computing.
    pub mergeable: Option<bool>,
    #[sea_orm(default_value = false)]
    pub locked: bool,
    /// Login of the PR author.
    pub author_login: String,

    // ─── Branches ────────────────────────────────────────────────────────────
    pub base_ref: String,
    pub head_ref: String,
    pub head_sha: String,

    // ─── Collections (JSON arrays) ───────────────────────────────────────────
    /// Label names.
    #[sea_orm(column_type = "Json")]
    pub labels: serde_json::Value,
    /// Logins of currently requested reviewers.
    #[sea_orm(column_type = "Json")]
    pub requested_reviewers: serde_json::Value,
    /// Paths the local user marked as viewed. Local-only state: sync and
    /// webhook writes never touch this column.
    #[sea_orm(column_type = "Json")]
    pub viewed_files: serde_json::Value,

    // ─── Timestamps ──────────────────────────────────────────────────────────
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub closed_at: Option<DateTimeWithTimeZone>,
    pub merged_at: Option<DateTimeWithTimeZone>,
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
    #[sea_orm(has_many = "super::review::Entity")]
    Review,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
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

    /// Viewed file paths as a vector; tolerates a malformed column.
    pub fn viewed_files_list(&self) -> Vec<String> {
        self.viewed_files
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
