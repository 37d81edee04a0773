//! Comment kind enum distinguishing the two host comment families.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which host comment family a comment row came from.
///
/// Issue comments live in the shared issue/PR timeline; review comments are
/// anchored to a file and line in a pull request diff. The two families have
/// independent remote ID spaces, so the kind participates in the
/// deterministic comment ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum CommentKind {
    #[sea_orm(string_value = "issue")]
    Issue,
    #[sea_orm(string_value = "review")]
    Review,
}

impl CommentKind {
    /// Stable string form, used as the kind part of deterministic comment IDs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CommentKind::Issue => "issue",
            CommentKind::Review => "review",
        }
    }
}

impl std::fmt::Display for CommentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
