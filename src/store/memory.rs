//! In-memory blob store, used by unit tests and dry runs.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use super::{BlobStore, StoreEntry};

#[derive(Clone, Debug)]
enum Node {
    File(Vec<u8>),
    Dir,
}

/// A [`BlobStore`] kept entirely in memory. Not thread-safe.
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
}

fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_parents(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) -> io::Result<()> {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            match nodes.get(ancestor) {
                Some(Node::Dir) => {}
                Some(Node::File(_)) => {
                    return Err(io::Error::other(format!(
                        "{} is a file, not a directory",
                        ancestor.display()
                    )));
                }
                None => {
                    nodes.insert(ancestor.to_owned(), Node::Dir);
                }
            }
        }
        Ok(())
    }
}

impl BlobStore for MemoryStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let path = normalize(path);
        match self.nodes.borrow().get(&path) {
            Some(Node::File(bytes)) => Ok(bytes.clone()),
            Some(Node::Dir) => Err(io::Error::other(format!(
                "{} is a directory",
                path.display()
            ))),
            None => Err(not_found(&path)),
        }
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.borrow_mut();
        if matches!(nodes.get(&path), Some(Node::Dir)) {
            return Err(io::Error::other(format!("{} is a directory", path.display())));
        }
        Self::ensure_parents(&mut nodes, &path)?;
        nodes.insert(path, Node::File(bytes.to_vec()));
        Ok(())
    }

    fn create_new(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if self.exists(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        self.write(path, bytes)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get(&path) {
            Some(Node::File(_)) => {
                nodes.remove(&path);
                Ok(())
            }
            Some(Node::Dir) => Err(io::Error::other(format!("{} is a directory", path.display()))),
            None => Err(not_found(&path)),
        }
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<StoreEntry>> {
        let dir = normalize(dir);
        if !self.is_dir(&dir) {
            return Err(not_found(&dir));
        }
        let nodes = self.nodes.borrow();
        let mut entries: Vec<StoreEntry> = nodes
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir.as_path()))
            .filter_map(|(path, node)| {
                let name = path.file_name()?.to_str()?.to_owned();
                Some(StoreEntry {
                    name,
                    is_dir: matches!(node, Node::Dir),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = normalize(path);
        path.as_os_str().is_empty() || matches!(self.nodes.borrow().get(&path), Some(Node::Dir))
    }

    fn exists(&self, path: &Path) -> bool {
        let path = normalize(path);
        path.as_os_str().is_empty() || self.nodes.borrow().contains_key(&path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        if path.as_os_str().is_empty() {
            return Ok(());
        }
        let mut nodes = self.nodes.borrow_mut();
        Self::ensure_parents(&mut nodes, &path)?;
        match nodes.get(&path) {
            Some(Node::File(_)) => Err(io::Error::other(format!(
                "{} is a file, not a directory",
                path.display()
            ))),
            Some(Node::Dir) => Ok(()),
            None => {
                nodes.insert(path, Node::Dir);
                Ok(())
            }
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let (from, to) = (normalize(from), normalize(to));
        if !self.exists(&from) {
            return Err(not_found(&from));
        }
        if self.exists(&to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("rename target {} already exists", to.display()),
            ));
        }
        let mut nodes = self.nodes.borrow_mut();
        Self::ensure_parents(&mut nodes, &to)?;
        let moved: Vec<PathBuf> = nodes
            .keys()
            .filter(|path| path.starts_with(&from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                let rest = old.strip_prefix(&from).map_err(io::Error::other)?;
                let new = if rest.as_os_str().is_empty() {
                    to.clone()
                } else {
                    to.join(rest)
                };
                nodes.insert(new, node);
            }
        }
        Ok(())
    }
}
