//! Error types for the sync layer.

use thiserror::Error;

use crate::github::HostError;
use crate::store::StoreError;

/// Errors surfaced by sync operations.
///
/// By the time a caller sees a `Host` variant, the unit's state row already
/// records the failure: status `error`, or `auth_invalid` for credential
/// failures.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The host rejected or failed a request.
    #[error("host error in {unit}: {source}")]
    Host {
        /// The unit label the failure belongs to.
        unit: String,
        /// The underlying host error.
        #[source]
        source: HostError,
    },
}

impl SyncError {
    /// Build a host error tagged with its unit label.
    pub(crate) fn host(unit: impl Into<String>, source: HostError) -> Self {
        Self::Host {
            unit: unit.into(),
            source,
        }
    }

    /// Whether the failure was an authentication failure. Full sync uses
    /// this to stop the whole run instead of moving to the next unit.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Host { source, .. } if source.is_auth())
    }
}

/// Convenience alias for sync results.
pub type Result<T, E = SyncError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_error_names_the_unit() {
        let err = SyncError::host("repository/user-1", HostError::Auth);
        assert!(err.to_string().contains("repository/user-1"));
        assert!(err.is_auth());
    }

    #[test]
    fn transient_host_error_is_not_auth() {
        let err = SyncError::host(
            "issue/user-1/acme/api",
            HostError::Transient {
                message: "connection reset".to_string(),
            },
        );
        assert!(!err.is_auth());
    }
}
