//! Blob store: the persistence collaborator behind commit chains.
//!
//! The engine needs very little from storage: read and write a named byte
//! blob, list a directory, create directories and move a subtree. The
//! [`BlobStore`] trait captures exactly that, with every path relative to
//! the store root (the `.vc` directory for [`FsStore`]).
//!
//! Errors are plain [`std::io::Error`]s; callers attach the path via
//! [`VcError::io`](crate::error::VcError::io).

use std::io;
use std::path::Path;

pub mod fs;
pub mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

/// One entry of a store directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreEntry {
    /// File or directory name.
    pub name: String,
    /// `true` for directories.
    pub is_dir: bool,
}

/// Hierarchical byte-blob storage.
pub trait BlobStore {
    /// Read a whole blob.
    ///
    /// # Errors
    /// `NotFound` if the blob does not exist.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write a blob atomically, creating parent directories.
    ///
    /// # Errors
    /// Any I/O failure.
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Create a blob that must not exist yet, creating parent directories.
    ///
    /// # Errors
    /// `AlreadyExists` if the blob exists.
    fn create_new(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Remove a blob.
    ///
    /// # Errors
    /// `NotFound` if the blob does not exist.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// List a directory, sorted by name.
    ///
    /// # Errors
    /// `NotFound` if the directory does not exist.
    fn list(&self, dir: &Path) -> io::Result<Vec<StoreEntry>>;

    /// `true` if `path` is an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// `true` if `path` exists (blob or directory).
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all of its parents.
    ///
    /// # Errors
    /// Any I/O failure.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Move a blob or directory subtree, creating the destination's parents.
    ///
    /// # Errors
    /// `NotFound` if `from` does not exist, `AlreadyExists` if `to` does.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}
