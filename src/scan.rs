//! Working tree scan.
//!
//! Breadth-first from the tree root: each directory is read in name order,
//! its files are yielded as they are met and its subdirectories are queued.
//! The order is therefore stable between runs, which keeps history entries
//! reproducible.
//!
//! Never tracked: entries named `.vc`, `.git` or `.commits`, anything
//! matching a `scan.ignore` glob, and entries that are neither regular files
//! nor directories (symlinks, sockets, ...).

use std::collections::VecDeque;
use std::path::PathBuf;

use glob::Pattern;
use keyvc_core::model::Key;

use crate::config::{ConfigError, ScanConfig};
use crate::error::{Result, VcError};
use crate::layout::RESERVED_NAMES;

/// One regular file found by the scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannedFile {
    /// The file's key.
    pub key: Key,
    /// Full contents at scan time.
    pub bytes: Vec<u8>,
}

/// Scanner over one working tree.
#[derive(Clone, Debug)]
pub struct TreeScanner {
    root: PathBuf,
    ignore: Vec<Pattern>,
}

impl TreeScanner {
    /// Scanner for the tree at `root`.
    ///
    /// # Errors
    /// [`VcError::Config`] if an ignore pattern does not compile.
    pub fn new(root: impl Into<PathBuf>, config: &ScanConfig) -> Result<Self> {
        let ignore = config
            .ignore
            .iter()
            .map(|raw| {
                Pattern::new(raw).map_err(|e| ConfigError {
                    path: None,
                    message: format!("scan.ignore pattern {raw:?}: {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            root: root.into(),
            ignore,
        })
    }

    fn ignored(&self, key: &Key) -> bool {
        self.ignore.iter().any(|p| p.matches(key.as_str()))
    }

    /// Read every tracked file.
    ///
    /// # Errors
    /// I/O errors reading a directory or file. Paths that cannot be keys
    /// (backslashes, non-UTF-8 names) are skipped with a warning.
    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        let mut files = Vec::new();
        let mut pending = VecDeque::from([PathBuf::new()]);

        while let Some(rel_dir) = pending.pop_front() {
            let dir = self.root.join(&rel_dir);
            let mut entries = std::fs::read_dir(&dir)
                .map_err(|e| VcError::io(&dir, e))?
                .collect::<std::io::Result<Vec<_>>>()
                .map_err(|e| VcError::io(&dir, e))?;
            entries.sort_by_key(std::fs::DirEntry::file_name);

            for entry in entries {
                let name = entry.file_name();
                if RESERVED_NAMES.iter().any(|reserved| name == *reserved) {
                    continue;
                }
                let rel = rel_dir.join(&name);
                let file_type = entry.file_type().map_err(|e| VcError::io(entry.path(), e))?;
                if !file_type.is_dir() && !file_type.is_file() {
                    tracing::debug!(path = %rel.display(), "skipping non-regular file");
                    continue;
                }
                let key = match Key::from_relative_path(&rel) {
                    Ok(key) => key,
                    Err(e) => {
                        tracing::warn!(
                            path = %rel.display(),
                            error = %e,
                            "skipping path that cannot be a key"
                        );
                        continue;
                    }
                };
                if file_type.is_dir() {
                    if self.ignored(&key) {
                        tracing::debug!(dir = %key, "ignored directory");
                    } else {
                        pending.push_back(rel);
                    }
                } else if self.ignored(&key) {
                    tracing::debug!(key = %key, "ignored file");
                } else {
                    let path = entry.path();
                    let bytes = std::fs::read(&path).map_err(|e| VcError::io(&path, e))?;
                    files.push(ScannedFile { key, bytes });
                }
            }
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write(root: &Path, rel: &str, bytes: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    fn keys(files: &[ScannedFile]) -> Vec<&str> {
        files.iter().map(|f| f.key.as_str()).collect()
    }

    #[test]
    fn breadth_first_with_files_before_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.txt", b"b");
        write(dir.path(), "a/deep/z.txt", b"z");
        write(dir.path(), "a/y.txt", b"y");
        write(dir.path(), "c/x.txt", b"x");

        let scanner = TreeScanner::new(dir.path(), &ScanConfig::default()).unwrap();
        let files = scanner.scan().unwrap();
        assert_eq!(keys(&files), vec!["b.txt", "a/y.txt", "c/x.txt", "a/deep/z.txt"]);
        assert_eq!(files[0].bytes, b"b");
    }

    #[test]
    fn reserved_names_are_never_scanned() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".vc/keys/a/.commits/x", b"");
        write(dir.path(), ".git/HEAD", b"ref");
        write(dir.path(), "src/.commits", b"looks like a chain");
        write(dir.path(), "src/lib.rs", b"fn main() {}");

        let scanner = TreeScanner::new(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(keys(&scanner.scan().unwrap()), vec!["src/lib.rs"]);
    }

    #[test]
    fn ignore_globs_skip_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "keep.txt", b"k");
        write(dir.path(), "debug.log", b"l");
        write(dir.path(), "target/out.bin", b"o");
        let config = ScanConfig {
            ignore: vec!["*.log".to_owned(), "target".to_owned()],
        };

        let scanner = TreeScanner::new(dir.path(), &config).unwrap();
        assert_eq!(keys(&scanner.scan().unwrap()), vec!["keep.txt"]);
    }

    #[test]
    fn bad_pattern_is_a_config_error() {
        let config = ScanConfig {
            ignore: vec!["[".to_owned()],
        };
        assert!(matches!(
            TreeScanner::new(".", &config),
            Err(VcError::Config(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn backslash_names_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ok.txt", b"o");
        write(dir.path(), "back\\slash.txt", b"b");
        let scanner = TreeScanner::new(dir.path(), &ScanConfig::default()).unwrap();
        let files = scanner.scan().unwrap();
        assert_eq!(keys(&files), vec!["ok.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_are_skipped() {
        use std::os::unix::ffi::OsStrExt as _;

        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ok.txt", b"o");
        let raw = std::ffi::OsStr::from_bytes(b"bad\xff.txt");
        if fs::write(dir.path().join(raw), b"x").is_err() {
            // Some filesystems refuse non-UTF-8 names.
            return;
        }
        let scanner = TreeScanner::new(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(keys(&scanner.scan().unwrap()), vec!["ok.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "real.txt", b"r");
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();
        let scanner = TreeScanner::new(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(keys(&scanner.scan().unwrap()), vec!["real.txt"]);
    }
}
