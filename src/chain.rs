//! Commit chains.
//!
//! A chain is the append-only set of commit files of one key, stored as
//! `<chain_root>/<key>/.commits/<commitId>`. Live chains sit under `keys/`;
//! a key that left the working tree has its whole chain moved under
//! `deleted/<timestamp>/`, and [`CommitChain`] reads both the same way.
//!
//! Records are immutable: [`CommitChain::append`] refuses to overwrite an
//! existing commit file.

use std::io;
use std::path::{Path, PathBuf};

use keyvc_core::model::{
    CommitId, CommitKind, ContentHash, EditScript, Key, LineDiffer, encode,
};

use crate::error::{Result, VcError};
use crate::layout;
use crate::store::BlobStore;

// ---------------------------------------------------------------------------
// CommitRecord
// ---------------------------------------------------------------------------

/// A commit about to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitRecord {
    /// Line diff producing content with the given hash.
    Diff {
        /// Operations replayed against the previous text revision.
        script: EditScript,
        /// Hash of the new full content.
        hash: ContentHash,
    },
    /// Full copy of binary content.
    Binary {
        /// The content.
        bytes: Vec<u8>,
        /// Hash of `bytes`.
        hash: ContentHash,
    },
    /// The key left the working tree.
    Deletion,
}

impl CommitRecord {
    /// Diff commit from `base` to `new`.
    ///
    /// # Errors
    /// [`VcError::NoChange`] if the two texts are identical.
    pub fn diff(key: &Key, differ: &dyn LineDiffer, base: &str, new: &str) -> Result<Self> {
        if base == new {
            return Err(VcError::NoChange { key: key.clone() });
        }
        Ok(Self::text_snapshot(differ, base, new))
    }

    /// Diff commit from `base` to `new` without the no-op check.
    ///
    /// Used for a key's first commit (an empty file is still a new
    /// revision) and when a key turns from binary back into text whose
    /// replayed form happens to be unchanged.
    #[must_use]
    pub fn text_snapshot(differ: &dyn LineDiffer, base: &str, new: &str) -> Self {
        Self::Diff {
            script: differ.diff(base, new),
            hash: ContentHash::of(new.as_bytes()),
        }
    }

    /// Binary commit.
    #[must_use]
    pub fn binary(bytes: Vec<u8>) -> Self {
        let hash = ContentHash::of(&bytes);
        Self::Binary { bytes, hash }
    }

    /// The commit kind this record produces.
    #[must_use]
    pub const fn kind(&self) -> CommitKind {
        match self {
            Self::Diff { .. } => CommitKind::Diff,
            Self::Binary { .. } => CommitKind::Binary,
            Self::Deletion => CommitKind::Deletion,
        }
    }

    /// The id this record gets when written at `timestamp`.
    #[must_use]
    pub const fn id(&self, timestamp: u64) -> CommitId {
        match self {
            Self::Diff { hash, .. } => CommitId::diff(timestamp, *hash),
            Self::Binary { hash, .. } => CommitId::binary(timestamp, *hash),
            Self::Deletion => CommitId::deletion(timestamp),
        }
    }

    /// Bytes stored in the commit file.
    #[must_use]
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Self::Diff { script, .. } => encode(script),
            Self::Binary { bytes, .. } => bytes.clone(),
            Self::Deletion => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// CommitChain
// ---------------------------------------------------------------------------

/// Access to the chains under one chain root.
#[derive(Debug)]
pub struct CommitChain<'a, S: BlobStore> {
    store: &'a S,
    root: PathBuf,
}

impl<'a, S: BlobStore> CommitChain<'a, S> {
    /// Chains under an arbitrary root.
    pub fn new(store: &'a S, root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            root: root.into(),
        }
    }

    /// Live chains (`keys/`).
    pub fn live(store: &'a S) -> Self {
        Self::new(store, layout::KEYS_DIR)
    }

    /// Chains archived by the pass at `timestamp` (`deleted/<timestamp>/`).
    pub fn archived(store: &'a S, timestamp: u64) -> Self {
        Self::new(store, layout::archive_root(timestamp))
    }

    /// The chain root, relative to the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `true` if the key has a commits directory under this root.
    #[must_use]
    pub fn exists(&self, key: &Key) -> bool {
        self.store.is_dir(&layout::commits_dir(&self.root, key))
    }

    /// Write `record` as a new commit of `key`.
    ///
    /// # Errors
    /// An I/O error, including `AlreadyExists` when a commit with the same
    /// id was already written.
    pub fn append(&self, key: &Key, record: &CommitRecord, timestamp: u64) -> Result<CommitId> {
        let id = record.id(timestamp);
        let dir = layout::commits_dir(&self.root, key);
        self.store
            .create_dir_all(&dir)
            .map_err(|e| VcError::io(&dir, e))?;
        let path = dir.join(id.to_string());
        self.store
            .create_new(&path, &record.payload())
            .map_err(|e| VcError::io(&path, e))?;
        tracing::debug!(key = %key, commit = %id, "commit appended");
        Ok(id)
    }

    /// All commit ids of `key`, oldest first. A key without a chain has
    /// none.
    ///
    /// # Errors
    /// An I/O error, or [`VcError::InvalidCommitId`] for a commit file whose
    /// name does not parse.
    pub fn list(&self, key: &Key) -> Result<Vec<CommitId>> {
        let dir = layout::commits_dir(&self.root, key);
        let entries = match self.store.list(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(VcError::io(&dir, e)),
        };
        let mut ids = entries
            .into_iter()
            // Hidden names are in-flight temp files.
            .filter(|entry| !entry.is_dir && !entry.name.starts_with('.'))
            .map(|entry| CommitId::parse(&entry.name))
            .collect::<Result<Vec<_>, _>>()?;
        ids.sort();
        Ok(ids)
    }

    /// The most recent commit of `key`, if any.
    ///
    /// # Errors
    /// Same as [`CommitChain::list`].
    pub fn latest(&self, key: &Key) -> Result<Option<CommitId>> {
        Ok(self.list(key)?.pop())
    }

    /// Raw payload of one commit.
    ///
    /// # Errors
    /// An I/O error if the commit file cannot be read.
    pub fn read(&self, key: &Key, id: &CommitId) -> Result<Vec<u8>> {
        let path = layout::commit_path(&self.root, key, id);
        self.store.read(&path).map_err(|e| VcError::io(&path, e))
    }

    /// Path of the key's directory (the one holding `.commits`).
    #[must_use]
    pub fn key_dir(&self, key: &Key) -> PathBuf {
        layout::key_dir(&self.root, key)
    }
}
