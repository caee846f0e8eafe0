//! Commit lock.
//!
//! A full commit (and a rebuild) holds `.vc/lock` for its whole duration.
//! The file is created with `create_new`, so a second invocation fails with
//! [`VcError::CommitInProgress`] instead of interleaving writes into the
//! same chains. A crashed process leaves the file behind; removing it by
//! hand is the documented recovery.

use std::io;
use std::path::Path;

use crate::error::{Result, VcError};
use crate::layout::LOCK_FILE;
use crate::store::BlobStore;

/// Guard for `.vc/lock`; removes the file on drop.
#[derive(Debug)]
pub struct CommitLock<'a, S: BlobStore> {
    store: &'a S,
}

impl<'a, S: BlobStore> CommitLock<'a, S> {
    /// Acquire the lock.
    ///
    /// # Errors
    /// [`VcError::CommitInProgress`] if the lock file exists, or an I/O
    /// error if it cannot be created.
    pub fn acquire(store: &'a S) -> Result<Self> {
        let pid = std::process::id().to_string();
        match store.create_new(Path::new(LOCK_FILE), pid.as_bytes()) {
            Ok(()) => {
                tracing::debug!(pid = %pid, "commit lock acquired");
                Ok(Self { store })
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(VcError::CommitInProgress {
                lock: Path::new(crate::layout::META_DIR).join(LOCK_FILE),
            }),
            Err(e) => Err(VcError::io(LOCK_FILE, e)),
        }
    }
}

impl<S: BlobStore> Drop for CommitLock<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.store.remove(Path::new(LOCK_FILE)) {
            tracing::warn!(error = %e, "failed to release commit lock");
        }
    }
}
