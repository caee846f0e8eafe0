//! File keys.
//!
//! A [`Key`] names one tracked file: its path relative to the working tree
//! root, always using `/` as the separator. The same string addresses the
//! key's chain inside the blob store (`keys/<key>/.commits/`), so a key may
//! never contain the chain marker as one of its components.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the per-key directory that holds commit payloads.
pub const COMMITS_DIR: &str = ".commits";

/// A validated, normalized relative file path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key(String);

/// Error returned when a key string or path is malformed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid key {value:?}: {reason}")]
pub struct KeyError {
    /// The rejected value.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

impl Key {
    /// Create a key from a `/`-separated relative path.
    ///
    /// # Errors
    /// Returns [`KeyError`] for empty or absolute paths, `.`/`..`/empty
    /// components, backslashes, or a `.commits` component.
    pub fn new(s: &str) -> Result<Self, KeyError> {
        Self::validate(s)?;
        Ok(Self(s.to_owned()))
    }

    /// Build a key from a path relative to the working tree root.
    ///
    /// # Errors
    /// Returns [`KeyError`] if a component is not valid UTF-8 or the
    /// resulting key fails validation.
    pub fn from_relative_path(path: &Path) -> Result<Self, KeyError> {
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| KeyError {
                        value: path.display().to_string(),
                        reason: "path is not valid UTF-8".to_owned(),
                    })?;
                    parts.push(name);
                }
                Component::CurDir => {}
                _ => {
                    return Err(KeyError {
                        value: path.display().to_string(),
                        reason: "path must be relative and must not leave the tree".to_owned(),
                    });
                }
            }
        }
        Self::new(&parts.join("/"))
    }

    /// The key as a `/`-separated string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key as a relative path, usable under the store's `keys/` root or
    /// the working tree root.
    #[must_use]
    pub fn to_path(&self) -> PathBuf {
        self.0.split('/').collect()
    }

    fn validate(s: &str) -> Result<(), KeyError> {
        let reject = |reason: &str| {
            Err(KeyError {
                value: s.to_owned(),
                reason: reason.to_owned(),
            })
        };
        if s.is_empty() {
            return reject("key must not be empty");
        }
        if s.starts_with('/') {
            return reject("key must be relative");
        }
        if s.contains('\\') {
            return reject("key must use '/' as the separator");
        }
        for part in s.split('/') {
            match part {
                "" => return reject("key must not contain empty components"),
                "." | ".." => return reject("key must not contain '.' or '..' components"),
                COMMITS_DIR => return reject("'.commits' is reserved for chain storage"),
                _ => {}
            }
        }
        Ok(())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Key {
    type Err = KeyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Key {
    type Error = KeyError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0
    }
}
