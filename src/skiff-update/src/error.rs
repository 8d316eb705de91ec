//! Error types for skiff-update.

use std::path::PathBuf;

use skiff_utils_git::GitError;
use thiserror::Error;

/// Result type for update operations.
pub type UpdateResult<T> = std::result::Result<T, UpdateError>;

/// Errors that can occur while checking for or applying an update.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// A version-control operation failed.
    #[error("version control error: {0}")]
    Git(#[from] GitError),

    /// A filesystem operation failed during cleanup.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UpdateError {
    /// Transient failures (remote unreachable) may succeed on a later cycle;
    /// everything else needs manual intervention before retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Git(err) => err.is_transient(),
            Self::Filesystem { .. } => false,
        }
    }
}
