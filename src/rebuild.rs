//! Rebuild: write the latest revision of every live key back into the
//! working tree.
//!
//! Binary keys are written from their latest binary commit, text keys from
//! their replayed chain. Files that are not keys are left alone, and keys
//! are visited in sorted order.

use std::path::Path;

use keyvc_core::model::Key;
use serde::Serialize;
use tracing::instrument;

use crate::error::{Result, VcError};
use crate::lock::CommitLock;
use crate::reconstruct::materialize;
use crate::repo::Repository;
use crate::store::BlobStore;

/// Outcome of a rebuild.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    /// Keys written, in order.
    pub written: Vec<Key>,
}

/// Rebuild every live key under the commit lock.
///
/// # Errors
/// [`VcError::CommitInProgress`] if a commit is running, reconstruction
/// failures, or I/O errors writing the working tree.
#[instrument(skip_all, fields(root = %repo.worktree().display()))]
pub fn rebuild<S: BlobStore>(repo: &Repository<S>) -> Result<RebuildReport> {
    let _lock = CommitLock::acquire(repo.store())?;
    let chain = repo.chain();
    let mut report = RebuildReport::default();

    for key in repo.keys()? {
        let revision = materialize(&chain, &key, None)?;
        write_file(&repo.worktree().join(key.to_path()), revision.as_bytes())?;
        tracing::debug!(key = %key, "rebuilt");
        report.written.push(key);
    }

    tracing::info!(keys = report.written.len(), "rebuild complete");
    Ok(report)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| VcError::io(dir, e))?;
    }
    std::fs::write(path, bytes).map_err(|e| VcError::io(path, e))
}
