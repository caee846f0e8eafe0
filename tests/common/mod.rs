//! Shared test helpers for keyvc integration tests.
#![allow(dead_code)]
//!
//! Provides [`TestTree`], a working tree in a temporary directory with the
//! `.vc` metadata directory already initialized. Each test gets its own
//! tree, cleaned up on drop.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use keyvc::Repository;
use keyvc::clock::FixedClock;
use keyvc_core::model::HistoryEntry;
use tempfile::TempDir;

/// An initialized working tree in a temp directory.
pub struct TestTree {
    /// Held to keep the directory alive.
    _dir: TempDir,
    root: PathBuf,
}

impl TestTree {
    /// Fresh tree with `.vc/` created.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let root = dir.path().to_path_buf();
        Repository::init(&root).expect("failed to init tree");
        Self { _dir: dir, root }
    }

    /// Fresh tree without `.vc/`.
    pub fn uninitialized() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let root = dir.path().to_path_buf();
        Self { _dir: dir, root }
    }

    /// The working tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open the repository (re-reads config each time).
    pub fn repo(&self) -> Repository {
        Repository::open(&self.root).expect("failed to open tree")
    }

    /// Write a file, creating parent directories.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) {
        let path = self.root.join(rel);
        std::fs::create_dir_all(path.parent().expect("file has a parent"))
            .expect("failed to create parent dirs");
        std::fs::write(&path, contents).expect("failed to write file");
    }

    /// Remove a file.
    pub fn remove(&self, rel: &str) {
        std::fs::remove_file(self.root.join(rel)).expect("failed to remove file");
    }

    /// Read a file, `None` if missing.
    pub fn read(&self, rel: &str) -> Option<Vec<u8>> {
        std::fs::read(self.root.join(rel)).ok()
    }

    /// Full commit at a fixed timestamp; panics on failure.
    pub fn commit_at(&self, ts: u64, message: &str) -> HistoryEntry {
        self.repo()
            .full_commit(message, &FixedClock(ts))
            .expect("full commit failed")
    }

    /// Files under `.vc/<rel>` (recursively), relative to that directory,
    /// sorted.
    pub fn meta_files(&self, rel: &str) -> Vec<String> {
        let base = self.root.join(".vc").join(rel);
        let mut out = Vec::new();
        collect(&base, &base, &mut out);
        out.sort();
        out
    }

    // -----------------------------------------------------------------------
    // CLI helpers
    // -----------------------------------------------------------------------

    /// Run the `keyvc` binary with `--root` set to this tree.
    pub fn keyvc_raw(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_keyvc"))
            .arg("--root")
            .arg(&self.root)
            .args(args)
            .env_remove("KEYVC_ROOT")
            .env_remove("KEYVC_TRACE")
            .output()
            .expect("failed to execute keyvc")
    }

    /// Run `keyvc` and assert it succeeds. Returns stdout as a string.
    ///
    /// # Panics
    /// Panics with stdout + stderr if the command fails.
    pub fn keyvc_ok(&self, args: &[&str]) -> String {
        let out = self.keyvc_raw(args);
        let stdout = String::from_utf8_lossy(&out.stdout);
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(
            out.status.success(),
            "keyvc {} failed:\nstdout: {stdout}\nstderr: {stderr}",
            args.join(" "),
        );
        stdout.to_string()
    }

    /// Run `keyvc` and assert it exits with `code`. Returns stderr.
    ///
    /// # Panics
    /// Panics if the exit code differs.
    pub fn keyvc_exit(&self, args: &[&str], code: i32) -> String {
        let out = self.keyvc_raw(args);
        assert_eq!(
            out.status.code(),
            Some(code),
            "keyvc {}:\nstdout: {}\nstderr: {}",
            args.join(" "),
            String::from_utf8_lossy(&out.stdout),
            String::from_utf8_lossy(&out.stderr),
        );
        String::from_utf8_lossy(&out.stderr).to_string()
    }
}

fn collect(base: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(base, &path, out);
        } else if let Ok(rel) = path.strip_prefix(base) {
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
}
