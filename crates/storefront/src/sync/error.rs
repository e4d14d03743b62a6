//! Synchronization errors.

use gemcase_core::CollectionKind;
use thiserror::Error;

use crate::db::RepositoryError;

/// Errors from the local (device-scoped) store.
#[derive(Debug, Error)]
pub enum LocalStoreError {
    /// The session backing the store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Stored data did not deserialize.
    #[error("malformed {kind} data: {source}")]
    Malformed {
        /// Collection whose key held the data.
        kind: CollectionKind,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Items could not be serialized.
    #[error("failed to serialize {kind}: {source}")]
    Serialize {
        /// Collection being saved.
        kind: CollectionKind,
        /// Underlying encode error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by collection synchronization.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local store operation failed.
    #[error("local store: {0}")]
    Local(#[from] LocalStoreError),

    /// Remote store operation failed.
    #[error("remote store: {0}")]
    Remote(#[from] RepositoryError),

    /// A background write task panicked or was aborted by the runtime.
    #[error("background write did not complete: {0}")]
    Aborted(String),
}
