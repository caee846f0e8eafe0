//! On-disk layout of the metadata directory.
//!
//! ```text
//! <worktree>/.vc/
//! ├── config.toml
//! ├── lock                               present while a commit runs
//! ├── keys/<key>/.commits/<commitId>     live chains
//! ├── deleted/<timestamp>/<key>/.commits archived chains
//! └── history/<timestamp>                one entry per full commit
//! ```
//!
//! Paths below the metadata directory are relative to the blob store root.

use std::path::{Path, PathBuf};

use keyvc_core::model::{COMMITS_DIR, CommitId, Key};

/// Metadata directory name inside the working tree.
pub const META_DIR: &str = ".vc";
/// Live chains root.
pub const KEYS_DIR: &str = "keys";
/// Archived chains root.
pub const DELETED_DIR: &str = "deleted";
/// History entries.
pub const HISTORY_DIR: &str = "history";
/// Configuration file.
pub const CONFIG_FILE: &str = "config.toml";
/// Commit lock file.
pub const LOCK_FILE: &str = "lock";

/// Directory names never tracked by the tree scanner.
pub const RESERVED_NAMES: [&str; 3] = [META_DIR, ".git", COMMITS_DIR];

/// Root of the archive area for the pass at `timestamp`.
#[must_use]
pub fn archive_root(timestamp: u64) -> PathBuf {
    Path::new(DELETED_DIR).join(timestamp.to_string())
}

/// `<chain_root>/<key>`.
#[must_use]
pub fn key_dir(chain_root: &Path, key: &Key) -> PathBuf {
    chain_root.join(key.to_path())
}

/// `<chain_root>/<key>/.commits`.
#[must_use]
pub fn commits_dir(chain_root: &Path, key: &Key) -> PathBuf {
    key_dir(chain_root, key).join(COMMITS_DIR)
}

/// `<chain_root>/<key>/.commits/<commitId>`.
#[must_use]
pub fn commit_path(chain_root: &Path, key: &Key, id: &CommitId) -> PathBuf {
    commits_dir(chain_root, key).join(id.to_string())
}

/// `history/<timestamp>`.
#[must_use]
pub fn history_path(timestamp: u64) -> PathBuf {
    Path::new(HISTORY_DIR).join(timestamp.to_string())
}
