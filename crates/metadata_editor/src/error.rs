//! Editor error kinds and their notification severity.

use metadata_host::{Notice, PersistenceError, Severity};
use thiserror::Error;

use crate::model::{MetadataMode, SessionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Problems with user input. Always recovered locally; the session stays open.
pub enum ValidationError {
    /// A new entry was saved without a key.
    #[error("A key is required for all metadata.")]
    KeyRequired,
    /// The key is not storable on the server.
    #[error("Invalid key {key}: keys must not contain the '.' character and must not start with '$'.")]
    InvalidKey {
        /// Rejected key.
        key: String,
    },
    /// The key already belongs to another entry.
    #[error("A metadatum with key {key} already exists.")]
    DuplicateKey {
        /// Conflicting key.
        key: String,
    },
    /// The value could not be parsed by the current mode.
    #[error("{message}")]
    InvalidValue {
        /// User-facing reason.
        message: String,
    },
    /// The target mode's validator rejected the pending value.
    #[error("{message}")]
    ModeConversionRejected {
        /// Mode the session was in.
        from: MetadataMode,
        /// Mode that was requested.
        to: MetadataMode,
        /// Message supplied by the target mode's descriptor.
        message: String,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors returned by [`crate::reduce_metadata`] and the [`crate::MetadataEditor`] driver.
pub enum EditorError {
    /// User input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The persistence collaborator rejected the change.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    /// The session was closed or never existed.
    #[error("edit session {0} is no longer open")]
    SessionNotFound(SessionId),
    /// No saved entry has this key.
    #[error("metadatum {0} not found")]
    EntryNotFound(String),
    /// The entry already has an open edit session.
    #[error("metadatum {key} is already being edited")]
    AlreadyEditing {
        /// Entry key.
        key: String,
        /// The session that is already open.
        session: SessionId,
    },
    /// A save for this session has not completed yet.
    #[error("a save is already in progress for this metadatum")]
    SaveInFlight,
    /// An add or edit request was accepted but produced no editor.
    #[error("no metadata editor was opened")]
    EditorNotOpened,
    /// The caller may not modify this item's metadata.
    #[error("you do not have permission to modify metadata on this item")]
    PermissionDenied,
}

impl EditorError {
    /// Severity used when the error is shown to the user.
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Persistence(_) => Severity::Danger,
            _ => Severity::Warning,
        }
    }

    /// Builds the user-facing notice for this error.
    pub fn notice(&self) -> Notice {
        Notice {
            text: self.to_string(),
            severity: self.severity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_failures_are_danger_and_keep_server_message() {
        let err = EditorError::from(PersistenceError::new("Invalid key a.b"));
        assert_eq!(err.notice(), Notice::danger("Invalid key a.b"));
    }

    #[test]
    fn validation_failures_are_warnings() {
        let err = EditorError::from(ValidationError::KeyRequired);
        assert_eq!(err.severity(), Severity::Warning);
        assert_eq!(err.to_string(), "A key is required for all metadata.");
    }
}
