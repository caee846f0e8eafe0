//! Error type for keyvc operations.
//!
//! [`VcError`] is returned by every store-backed operation. Variants follow
//! four families:
//!
//! - **I/O**: a blob or working-tree read/write failed. Always aborts.
//! - **Codec / corrupt data**: a stored diff, commit id or history entry
//!   could not be parsed. Aborts reconstruction of the affected key.
//! - **No-op**: `NoChange` and `NothingToCommit` are expected outcomes;
//!   callers treat them as "nothing to do" (see [`VcError::is_noop`]).
//! - **Not found**: a key or commit that has no chain.

use std::path::{Path, PathBuf};

use keyvc_core::model::{CodecError, CommitId, CommitIdError, HistoryError, Key, KeyError};
use thiserror::Error;

use crate::config::ConfigError;

/// Unified error type for keyvc operations.
#[derive(Debug, Error)]
pub enum VcError {
    /// A filesystem or blob-store operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A stored diff could not be replayed.
    #[error("cannot replay commit {commit} of key '{key}': {source}")]
    Codec {
        /// The key whose chain is corrupt.
        key: Key,
        /// The commit that failed.
        commit: CommitId,
        /// The codec failure.
        #[source]
        source: CodecError,
    },

    /// A commit file name or user-supplied commit id is malformed.
    #[error(transparent)]
    InvalidCommitId(#[from] CommitIdError),

    /// A key is malformed.
    #[error(transparent)]
    InvalidKey(#[from] KeyError),

    /// A history entry is malformed.
    #[error("corrupt history entry {timestamp}: {source}")]
    History {
        /// The entry's timestamp (file name).
        timestamp: String,
        /// The parse failure.
        #[source]
        source: HistoryError,
    },

    /// The key has no commits.
    #[error("key '{key}' not found: it has no commits")]
    KeyNotFound {
        /// The requested key.
        key: Key,
    },

    /// The commit is not part of the key's chain.
    #[error("commit {commit} not found in the chain of key '{key}'")]
    CommitNotFound {
        /// The key.
        key: Key,
        /// The missing commit.
        commit: CommitId,
    },

    /// A diff commit would not change the content.
    #[error("content of key '{key}' is unchanged; commit not created")]
    NoChange {
        /// The key.
        key: Key,
    },

    /// A full commit found no additions, changes or deletions.
    #[error("nothing to commit: the working tree matches the latest revision of every key")]
    NothingToCommit,

    /// Another full commit or rebuild holds the lock.
    #[error(
        "a commit is already in progress (lock file {} exists).\n  To fix: wait for it to finish, or remove the lock file if no keyvc process is running.",
        lock.display()
    )]
    CommitInProgress {
        /// Path of the lock file.
        lock: PathBuf,
    },

    /// The working tree has no metadata directory.
    #[error("{} is not a keyvc tree.\n  To fix: run `keyvc init` first.", root.display())]
    NotInitialized {
        /// The working tree root.
        root: PathBuf,
    },

    /// The configuration file is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl VcError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_owned(),
            source,
        }
    }

    /// `true` for the expected "nothing to do" outcomes.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::NoChange { .. } | Self::NothingToCommit)
    }

    /// Process exit code for this error (sysexits-style).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::NoChange { .. } | Self::NothingToCommit => 1,
            Self::Codec { .. }
            | Self::InvalidCommitId(_)
            | Self::InvalidKey(_)
            | Self::History { .. } => 65,
            Self::KeyNotFound { .. } | Self::CommitNotFound { .. } | Self::NotInitialized { .. } => {
                66
            }
            Self::Io { .. } => 74,
            Self::CommitInProgress { .. } => 75,
            Self::Config(_) => 78,
        }
    }
}

/// Result alias for keyvc operations.
pub type Result<T, E = VcError> = std::result::Result<T, E>;
