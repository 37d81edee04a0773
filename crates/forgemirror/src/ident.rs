//! Deterministic identifier derivation.
//!
//! Records can arrive through two independent paths (incremental sync and
//! webhook ingestion), so primary keys must be reconstructible from identity
//! fields alone. IDs are version-5 UUIDs: the namespace label is first hashed
//! into a namespace UUID, then the ordered parts are joined and hashed under
//! it. Equal input always yields the same UUID; changing or reordering any
//! part yields a different one.

use uuid::Uuid;

/// Root namespace for all forgemirror-derived UUIDs.
///
/// Fixed at project creation; changing it would re-key every mirrored row.
const ROOT_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6f, 0x1c, 0x2a, 0x84, 0x9b, 0x3d, 0x4e, 0x7f, 0x8a, 0x65, 0xd0, 0x42, 0x15, 0xc8, 0x3b, 0x9e,
]);

/// Join separator for ID parts. ASCII unit separator never occurs in remote
/// identifiers (logins, repo names, refs, numeric IDs), so distinct part
/// lists can never collapse to the same joined string.
const PART_SEPARATOR: char = '\u{1f}';

/// Derive a deterministic UUID from a namespace label and ordered parts.
///
/// The namespace label is itself part of the derivation, so identical parts
/// under different namespaces produce different IDs.
pub fn deterministic_id(namespace: &str, parts: &[&str]) -> Uuid {
    let ns = Uuid::new_v5(&ROOT_NAMESPACE, namespace.as_bytes());
    let joined = parts.join(&PART_SEPARATOR.to_string());
    Uuid::new_v5(&ns, joined.as_bytes())
}

/// ID of the sync-state row for (kind, user, optional resource ref).
///
/// A missing resource ref (whole-account kinds like `credential`) is encoded
/// as the empty string so the key stays three parts wide.
pub fn sync_state_id(kind: &str, user_id: &str, resource_ref: Option<&str>) -> Uuid {
    deterministic_id("syncState", &[kind, user_id, resource_ref.unwrap_or("")])
}

/// ID of a mirrored repository row.
pub fn repository_id(user_id: &str, owner: &str, name: &str) -> Uuid {
    deterministic_id("repository", &[user_id, owner, name])
}

/// ID of a mirrored pull request row.
pub fn pull_request_id(user_id: &str, owner: &str, name: &str, number: i32) -> Uuid {
    deterministic_id("pullRequest", &[user_id, owner, name, &number.to_string()])
}

/// ID of a mirrored issue row.
pub fn issue_id(user_id: &str, owner: &str, name: &str, number: i32) -> Uuid {
    deterministic_id("issue", &[user_id, owner, name, &number.to_string()])
}

/// ID of a mirrored review row. Review IDs are globally unique on the remote
/// side, so the remote ID plus the owning tenant is sufficient.
pub fn review_id(user_id: &str, remote_id: i64) -> Uuid {
    deterministic_id("review", &[user_id, &remote_id.to_string()])
}

/// ID of a mirrored comment row. Issue comments and review comments live in
/// separate remote ID spaces, so the kind discriminator is part of identity.
pub fn comment_id(user_id: &str, kind: &str, remote_id: i64) -> Uuid {
    deterministic_id("comment", &[user_id, kind, &remote_id.to_string()])
}

/// ID of a mirrored check-run row.
pub fn check_run_id(user_id: &str, remote_id: i64) -> Uuid {
    deterministic_id("checkRun", &[user_id, &remote_id.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_input_yields_equal_id() {
        let sets: [(&str, &[&str]); 5] = [
            ("repoTree", &["repo1", "main", "README.md"]),
            ("pullRequest", &["user-1", "octo", "widgets", "42"]),
            ("syncState", &["tree", "user-1", "repo:main"]),
            ("comment", &["user-2", "review", "901812"]),
            ("repository", &["user-1", "octo", "widgets"]),
        ];

        for (namespace, parts) in sets {
            assert_eq!(
                deterministic_id(namespace, parts),
                deterministic_id(namespace, parts),
                "derivation must be stable for {namespace}"
            );
        }
    }

    #[test]
    fn test_namespace_distinguishes_identical_parts() {
        let tree = deterministic_id("repoTree", &["repo1", "main", "README.md"]);
        let commit = deterministic_id("repoCommit", &["repo1", "main", "README.md"]);
        assert_ne!(tree, commit);
    }

    #[test]
    fn test_any_changed_part_changes_id() {
        let base = deterministic_id("pullRequest", &["user-1", "octo", "widgets", "42"]);

        assert_ne!(
            base,
            deterministic_id("pullRequest", &["user-2", "octo", "widgets", "42"])
        );
        assert_ne!(
            base,
            deterministic_id("pullRequest", &["user-1", "octo", "gadgets", "42"])
        );
        assert_ne!(
            base,
            deterministic_id("pullRequest", &["user-1", "octo", "widgets", "43"])
        );
    }

    #[test]
    fn test_reordered_parts_change_id() {
        let forward = deterministic_id("repoTree", &["repo1", "main"]);
        let reversed = deterministic_id("repoTree", &["main", "repo1"]);
        assert_ne!(forward, reversed);
    }

    #[test]
    fn test_part_boundaries_are_not_ambiguous() {
        // "ab" + "c" must not collide with "a" + "bc".
        let left = deterministic_id("repository", &["ab", "c"]);
        let right = deterministic_id("repository", &["a", "bc"]);
        assert_ne!(left, right);
    }

    #[test]
    fn test_sync_state_id_treats_missing_ref_consistently() {
        let a = sync_state_id("credential", "user-1", None);
        let b = sync_state_id("credential", "user-1", None);
        assert_eq!(a, b);

        let scoped = sync_state_id("credential", "user-1", Some("x"));
        assert_ne!(a, scoped);
    }

    #[test]
    fn test_wrappers_match_raw_derivation() {
        assert_eq!(
            pull_request_id("user-1", "octo", "widgets", 42),
            deterministic_id("pullRequest", &["user-1", "octo", "widgets", "42"])
        );
        assert_eq!(
            review_id("user-1", 77),
            deterministic_id("review", &["user-1", "77"])
        );
    }

    #[test]
    fn test_ids_are_v5() {
        let id = repository_id("user-1", "octo", "widgets");
        assert_eq!(id.get_version_num(), 5);
    }
}
