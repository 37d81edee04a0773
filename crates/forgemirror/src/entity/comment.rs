//! Comment entity - issue comments and review comments in one table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::comment_kind::CommentKind;

/// Comment model - one row per (user, kind, remote comment ID).
///
/// Exactly one of `pull_request_id` / `issue_id` is set. Issue comments on a
/// pull request attach to the pull request row, since the host shares one
/// timeline between issues and PRs.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    /// Deterministic UUID derived from (user, kind, remote ID).
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Which host comment family this row came from.
    pub kind: CommentKind,
    /// Parent pull request, when the comment targets a PR.
    pub pull_request_id: Option<Uuid>,
    /// Parent issue, when the comment targets a plain issue.
    pub issue_id: Option<Uuid>,
    /// Tenant key.
    pub user_id: String,
    /// Numeric ID assigned by the host, unique within the kind's ID space.
    pub remote_id: i64,

    pub author_login: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    /// File path, for review comments.
    pub path: Option<String>,
    /// Diff line, for review comments.
    pub line: Option<i32>,

    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
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
    #[sea_orm(
        belongs_to = "super::issue::Entity",
        from = "Column::IssueId",
        to = "super::issue::Column::Id"
    )]
    Issue,
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

impl ActiveModelBehavior for ActiveModel {}
