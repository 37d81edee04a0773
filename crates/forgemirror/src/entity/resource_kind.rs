//! Resource kind enum identifying what a sync state row tracks.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kinds of resources a sync state row can track.
///
/// Most kinds correspond to a mirrored table; [`ResourceKind::Tree`] and
/// [`ResourceKind::Commit`] track fetch activity for data served straight
/// from the host, [`ResourceKind::Credential`] tracks token health, and
/// [`ResourceKind::FullSync`] tracks the multi-phase backfill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ResourceKind {
    #[sea_orm(string_value = "repository")]
    Repository,
    #[sea_orm(string_value = "pull_request")]
    PullRequest,
    #[sea_orm(string_value = "issue")]
    Issue,
    #[sea_orm(string_value = "review")]
    Review,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "tree")]
    Tree,
    #[sea_orm(string_value = "commit")]
    Commit,
    #[sea_orm(string_value = "check_run")]
    CheckRun,
    #[sea_orm(string_value = "credential")]
    Credential,
    #[sea_orm(string_value = "full_sync")]
    FullSync,
}

impl ResourceKind {
    /// Stable string form, used both for display and as the kind part of
    /// deterministic sync state IDs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Repository => "repository",
            ResourceKind::PullRequest => "pull_request",
            ResourceKind::Issue => "issue",
            ResourceKind::Review => "review",
            ResourceKind::Comment => "comment",
            ResourceKind::Tree => "tree",
            ResourceKind::Commit => "commit",
            ResourceKind::CheckRun => "check_run",
            ResourceKind::Credential => "credential",
            ResourceKind::FullSync => "full_sync",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "repository" => Ok(ResourceKind::Repository),
            "pull_request" | "pulls" => Ok(ResourceKind::PullRequest),
            "issue" | "issues" => Ok(ResourceKind::Issue),
            "review" | "reviews" => Ok(ResourceKind::Review),
            "comment" | "comments" => Ok(ResourceKind::Comment),
            "tree" => Ok(ResourceKind::Tree),
            "commit" => Ok(ResourceKind::Commit),
            "check_run" | "checks" => Ok(ResourceKind::CheckRun),
            "credential" => Ok(ResourceKind::Credential),
            "full_sync" => Ok(ResourceKind::FullSync),
            _ => Err(format!("unknown resource kind: {s}")),
        }
    }
}
