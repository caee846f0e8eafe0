//! Key index: which keys have a chain under a chain root.
//!
//! The chain root mirrors the working tree's directory structure. A
//! directory that holds a `.commits` child is a key; any other directory is
//! a container and is searched further.

use std::collections::{BTreeSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};

use keyvc_core::model::{COMMITS_DIR, Key};

use crate::error::{Result, VcError};
use crate::store::BlobStore;

/// What a directory under a chain root turned out to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexNode {
    /// A key: the directory holds a chain.
    Key(Key),
    /// A plain directory, relative to the chain root.
    Container(PathBuf),
}

/// Resolve one directory (relative to `chain_root`).
///
/// # Errors
/// [`VcError::InvalidKey`] if the directory holds a chain but its path is
/// not a valid key.
pub fn resolve<S: BlobStore>(store: &S, chain_root: &Path, rel: &Path) -> Result<IndexNode> {
    if store.is_dir(&chain_root.join(rel).join(COMMITS_DIR)) {
        Ok(IndexNode::Key(Key::from_relative_path(rel)?))
    } else {
        Ok(IndexNode::Container(rel.to_owned()))
    }
}

/// The set of keys found under one chain root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyIndex {
    keys: BTreeSet<Key>,
}

impl KeyIndex {
    /// Walk `chain_root` breadth-first and collect every key. A missing
    /// root is an empty index.
    ///
    /// # Errors
    /// I/O errors listing a directory, or an invalid key path.
    pub fn load<S: BlobStore>(store: &S, chain_root: &Path) -> Result<Self> {
        let mut keys = BTreeSet::new();
        let mut pending = VecDeque::from([PathBuf::new()]);

        while let Some(dir) = pending.pop_front() {
            let abs = chain_root.join(&dir);
            let entries = match store.list(&abs) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound && dir.as_os_str().is_empty() => {
                    break;
                }
                Err(e) => return Err(VcError::io(&abs, e)),
            };
            for entry in entries {
                if !entry.is_dir || entry.name == COMMITS_DIR {
                    continue;
                }
                match resolve(store, chain_root, &dir.join(&entry.name))? {
                    IndexNode::Key(key) => {
                        keys.insert(key);
                    }
                    IndexNode::Container(rel) => pending.push_back(rel),
                }
            }
        }

        Ok(Self { keys })
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter()
    }

    /// `true` if `key` has a chain.
    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        self.keys.contains(key)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// `true` if no key was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl IntoIterator for KeyIndex {
    type Item = Key;
    type IntoIter = std::collections::btree_set::IntoIter<Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn touch(store: &MemoryStore, path: &str) {
        store.write(Path::new(path), b"").unwrap();
    }

    #[test]
    fn missing_root_is_empty() {
        let store = MemoryStore::new();
        assert!(KeyIndex::load(&store, Path::new("keys")).unwrap().is_empty());
    }

    #[test]
    fn finds_nested_keys_and_skips_containers() {
        let store = MemoryStore::new();
        touch(&store, "keys/README/.commits/d1+deleted");
        touch(&store, "keys/src/main.rs/.commits/d1+deleted");
        touch(&store, "keys/src/deep/er/x.txt/.commits/d1+deleted");
        store.create_dir_all(Path::new("keys/empty/dir")).unwrap();

        let index = KeyIndex::load(&store, Path::new("keys")).unwrap();
        let keys: Vec<&str> = index.keys().map(Key::as_str).collect();
        assert_eq!(keys, vec!["README", "src/deep/er/x.txt", "src/main.rs"]);
        assert!(index.contains(&Key::new("src/main.rs").unwrap()));
        assert!(!index.contains(&Key::new("src").unwrap()));
    }

    #[test]
    fn resolve_distinguishes_keys_from_containers() {
        let store = MemoryStore::new();
        touch(&store, "keys/a/b/.commits/d1+deleted");
        assert_eq!(
            resolve(&store, Path::new("keys"), Path::new("a")).unwrap(),
            IndexNode::Container(PathBuf::from("a"))
        );
        assert_eq!(
            resolve(&store, Path::new("keys"), Path::new("a/b")).unwrap(),
            IndexNode::Key(Key::new("a/b").unwrap())
        );
    }

    #[test]
    fn dot_named_keys_and_containers_are_found() {
        let store = MemoryStore::new();
        touch(&store, "keys/.env/.commits/d1+deleted");
        touch(&store, "keys/.github/ci.yml/.commits/d1+deleted");
        touch(&store, "keys/a.txt/.commits/d1+deleted");

        let index = KeyIndex::load(&store, Path::new("keys")).unwrap();
        let keys: Vec<&str> = index.keys().map(Key::as_str).collect();
        assert_eq!(keys, vec![".env", ".github/ci.yml", "a.txt"]);
    }
}
