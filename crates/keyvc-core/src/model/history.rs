//! History entry text format.
//!
//! One history entry is written per orchestration pass, named by the pass
//! timestamp:
//!
//! ```text
//! 1                                   number of message lines (N)
//! fix bug                             N message lines
//! src/main.rs/.commits/d1700000000+…  one commit reference per line
//! logo.png/.commits/b1700000000+…
//! ```

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::commit_id::{CommitId, CommitIdError};
use super::key::{COMMITS_DIR, Key, KeyError};

/// Errors raised while parsing a history entry or a commit reference.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// The first line is not a message line count.
    #[error("history entry has an invalid message line count {0:?}")]
    InvalidLineCount(String),

    /// Fewer message lines than announced.
    #[error("history entry announces {expected} message line(s) but has {found}")]
    TruncatedMessage {
        /// Announced count.
        expected: usize,
        /// Lines actually present.
        found: usize,
    },

    /// A reference line without the `/.commits/` separator.
    #[error("malformed commit reference {0:?}")]
    MalformedRef(String),

    /// The key part of a reference is invalid.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// The commit id part of a reference is invalid.
    #[error(transparent)]
    CommitId(#[from] CommitIdError),
}

// ---------------------------------------------------------------------------
// CommitRef
// ---------------------------------------------------------------------------

/// Reference to one commit of one key: `<key>/.commits/<commitId>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitRef {
    /// The key the commit belongs to.
    pub key: Key,
    /// The commit.
    pub commit: CommitId,
}

impl CommitRef {
    /// Create a reference.
    #[must_use]
    pub const fn new(key: Key, commit: CommitId) -> Self {
        Self { key, commit }
    }

    /// Parse `<key>/.commits/<commitId>`.
    ///
    /// # Errors
    /// Returns [`HistoryError`] if the separator is missing or either part
    /// fails validation.
    pub fn parse(s: &str) -> Result<Self, HistoryError> {
        let sep = format!("/{COMMITS_DIR}/");
        let (key, commit) = s
            .rsplit_once(&sep)
            .ok_or_else(|| HistoryError::MalformedRef(s.to_owned()))?;
        Ok(Self {
            key: Key::new(key)?,
            commit: CommitId::parse(commit)?,
        })
    }
}

impl fmt::Display for CommitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{COMMITS_DIR}/{}", self.key, self.commit)
    }
}

// ---------------------------------------------------------------------------
// HistoryEntry
// ---------------------------------------------------------------------------

/// One user-facing commit: every per-key commit made in a single pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Pass timestamp; also the entry's file name.
    pub timestamp: u64,
    /// Free-text commit message (may span lines).
    pub message: String,
    /// Commits produced in the pass, in creation order.
    pub commits: Vec<CommitRef>,
}

impl HistoryEntry {
    /// Render the on-disk text. There is no trailing newline.
    #[must_use]
    pub fn render(&self) -> String {
        let line_count = self.message.split('\n').count();
        let mut out = format!("{line_count}\n{}", self.message);
        for commit in &self.commits {
            out.push('\n');
            out.push_str(&commit.to_string());
        }
        out
    }

    /// Parse the on-disk text of the entry named `timestamp`.
    ///
    /// # Errors
    /// Returns [`HistoryError`] for a bad line count, a truncated message or
    /// any malformed commit reference.
    pub fn parse(timestamp: u64, text: &str) -> Result<Self, HistoryError> {
        let mut lines = text.split('\n');
        let count_line = lines.next().unwrap_or_default();
        let line_count: usize = count_line
            .trim()
            .parse()
            .map_err(|_| HistoryError::InvalidLineCount(count_line.to_owned()))?;
        if line_count == 0 {
            return Err(HistoryError::InvalidLineCount(count_line.to_owned()));
        }

        let message_lines: Vec<&str> = lines.by_ref().take(line_count).collect();
        if message_lines.len() < line_count {
            return Err(HistoryError::TruncatedMessage {
                expected: line_count,
                found: message_lines.len(),
            });
        }

        let commits = lines
            .filter(|line| !line.is_empty())
            .map(CommitRef::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            timestamp,
            message: message_lines.join("\n"),
            commits,
        })
    }
}
