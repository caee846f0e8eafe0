//! Repository facade: a working tree, its blob store and its configuration.

use std::path::{Path, PathBuf};

use keyvc_core::model::{CommitId, HistoryEntry, Key, LineDiffer};

use crate::chain::CommitChain;
use crate::clock::{Clock, pass_timestamp};
use crate::config::VcConfig;
use crate::error::{Result, VcError};
use crate::history;
use crate::index::KeyIndex;
use crate::layout::{CONFIG_FILE, DELETED_DIR, HISTORY_DIR, KEYS_DIR, META_DIR};
use crate::orchestrate::{self, CommitPlan};
use crate::rebuild::{self, RebuildReport};
use crate::reconstruct::{self, Revision};
use crate::store::{BlobStore, FsStore};

/// A versioned working tree.
#[derive(Debug)]
pub struct Repository<S: BlobStore = FsStore> {
    worktree: PathBuf,
    store: S,
    config: VcConfig,
}

impl Repository<FsStore> {
    /// Create the metadata directory under `worktree` (if missing) and open
    /// the repository. Existing chains and history are left untouched.
    ///
    /// # Errors
    /// I/O errors creating the directories, or an invalid config file.
    pub fn init(worktree: impl Into<PathBuf>) -> Result<Self> {
        let worktree = worktree.into();
        let meta = worktree.join(META_DIR);
        for dir in [KEYS_DIR, DELETED_DIR, HISTORY_DIR] {
            let path = meta.join(dir);
            std::fs::create_dir_all(&path).map_err(|e| VcError::io(&path, e))?;
        }
        tracing::info!(root = %worktree.display(), "initialized metadata directory");
        Self::open(worktree)
    }

    /// Open an initialized working tree.
    ///
    /// # Errors
    /// [`VcError::NotInitialized`] if there is no metadata directory, or
    /// [`VcError::Config`] for an invalid config file.
    pub fn open(worktree: impl Into<PathBuf>) -> Result<Self> {
        let worktree = worktree.into();
        let meta = worktree.join(META_DIR);
        if !meta.join(KEYS_DIR).is_dir() {
            return Err(VcError::NotInitialized { root: worktree });
        }
        let config = VcConfig::load(&meta.join(CONFIG_FILE))?;
        Ok(Self {
            store: FsStore::new(meta),
            worktree,
            config,
        })
    }
}

impl<S: BlobStore> Repository<S> {
    /// Repository over an arbitrary store.
    pub fn with_store(worktree: impl Into<PathBuf>, store: S, config: VcConfig) -> Self {
        Self {
            worktree: worktree.into(),
            store,
            config,
        }
    }

    /// The working tree root.
    #[must_use]
    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    /// The blob store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &VcConfig {
        &self.config
    }

    /// Differ for new diff commits.
    #[must_use]
    pub fn differ(&self) -> &'static dyn LineDiffer {
        self.config.diff.strategy.differ()
    }

    /// Live chains.
    #[must_use]
    pub fn chain(&self) -> CommitChain<'_, S> {
        CommitChain::live(&self.store)
    }

    /// Chains archived by the pass at `timestamp`.
    #[must_use]
    pub fn archived_chain(&self, timestamp: u64) -> CommitChain<'_, S> {
        CommitChain::archived(&self.store, timestamp)
    }

    /// Keys with a live chain.
    ///
    /// # Errors
    /// I/O errors walking the store.
    pub fn keys(&self) -> Result<KeyIndex> {
        KeyIndex::load(&self.store, Path::new(KEYS_DIR))
    }

    /// Text of a live key, up to `upto` or its latest commit.
    ///
    /// # Errors
    /// See [`reconstruct::cat`].
    pub fn cat(&self, key: &Key, upto: Option<&CommitId>) -> Result<String> {
        reconstruct::cat(&self.chain(), key, upto)
    }

    /// Latest text of a live key.
    ///
    /// # Errors
    /// See [`reconstruct::last_cat`].
    pub fn last_cat(&self, key: &Key) -> Result<String> {
        reconstruct::last_cat(&self.chain(), key)
    }

    /// Binary-aware content of a live key.
    ///
    /// # Errors
    /// See [`reconstruct::materialize`].
    pub fn materialize(&self, key: &Key, upto: Option<&CommitId>) -> Result<Revision> {
        reconstruct::materialize(&self.chain(), key, upto)
    }

    /// Binary-aware content of a key archived by the pass at `timestamp`.
    ///
    /// # Errors
    /// See [`reconstruct::materialize`].
    pub fn cat_archived(
        &self,
        timestamp: u64,
        key: &Key,
        upto: Option<&CommitId>,
    ) -> Result<Revision> {
        reconstruct::materialize(&self.archived_chain(timestamp), key, upto)
    }

    /// What a full commit would write now.
    ///
    /// # Errors
    /// See [`orchestrate::plan`].
    pub fn plan(&self, clock: &dyn Clock) -> Result<CommitPlan> {
        let ts = pass_timestamp(clock, history::latest_timestamp(&self.store)?);
        orchestrate::plan(self, ts)
    }

    /// Commit every change in the working tree.
    ///
    /// # Errors
    /// See [`orchestrate::full_commit`].
    pub fn full_commit(&self, message: &str, clock: &dyn Clock) -> Result<HistoryEntry> {
        orchestrate::full_commit(self, message, clock)
    }

    /// Recorded history, oldest first.
    ///
    /// # Errors
    /// See [`history::list_entries`].
    pub fn history(&self) -> Result<Vec<HistoryEntry>> {
        history::list_entries(&self.store)
    }

    /// Write the latest revision of every live key into the working tree.
    ///
    /// # Errors
    /// See [`rebuild::rebuild`].
    pub fn rebuild(&self) -> Result<RebuildReport> {
        rebuild::rebuild(self)
    }
}
