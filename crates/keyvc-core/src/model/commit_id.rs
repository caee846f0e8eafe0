//! Commit identifiers.
//!
//! On disk a commit id is a single string, `<kind><timestamp>+<suffix>`:
//!
//! ```text
//! d1700000000+9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08   diff
//! b1700000000+0f343b0931126a20f133d67c2b018a3b...                                binary
//! d1700000000+deleted                                                            deletion marker
//! ```
//!
//! The suffix is the SHA-256 of the *new* full content, or the literal
//! `deleted`. [`CommitId`] keeps the three parts apart and re-validates the
//! string form every time one is parsed.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const DELETED_SUFFIX: &str = "deleted";

// ---------------------------------------------------------------------------
// ContentHash
// ---------------------------------------------------------------------------

/// SHA-256 digest of a file's full content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash `bytes`.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Self(out)
    }

    /// Parse a 64-character lowercase hex digest.
    ///
    /// # Errors
    /// Returns [`CommitIdError`] if the string is not exactly 64 lowercase
    /// hex characters.
    pub fn from_hex(s: &str) -> Result<Self, CommitIdError> {
        if s.len() != 64 {
            return Err(CommitIdError::new(
                s,
                format!("expected 64 hex characters, got {}", s.len()),
            ));
        }
        let mut out = [0u8; 32];
        for (i, pair) in s.as_bytes().chunks(2).enumerate() {
            let hi = hex_value(pair[0]);
            let lo = hex_value(pair[1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => out[i] = (hi << 4) | lo,
                _ => {
                    return Err(CommitIdError::new(
                        s,
                        "must contain only lowercase hex characters (0-9, a-f)",
                    ));
                }
            }
        }
        Ok(Self(out))
    }

    /// Lowercase hex rendering (64 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut hex = String::with_capacity(64);
        for b in &self.0 {
            use std::fmt::Write as _;
            let _ = write!(hex, "{b:02x}");
        }
        hex
    }
}

const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// CommitKind
// ---------------------------------------------------------------------------

/// What a commit payload contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitKind {
    /// Line diff against the previous text revision.
    Diff,
    /// Full copy of binary content.
    Binary,
    /// Empty marker recorded when the key left the working tree.
    Deletion,
}

impl CommitKind {
    /// The leading character of the serialized id.
    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Self::Diff | Self::Deletion => 'd',
            Self::Binary => 'b',
        }
    }
}

impl fmt::Display for CommitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diff => write!(f, "diff"),
            Self::Binary => write!(f, "binary"),
            Self::Deletion => write!(f, "deletion"),
        }
    }
}

// ---------------------------------------------------------------------------
// CommitId
// ---------------------------------------------------------------------------

/// A parsed commit id.
///
/// Ordering is by numeric timestamp first and the rendered string second.
/// For timestamps of equal width this is the lexical order of the file
/// names; unlike a plain string sort it stays chronological when the
/// timestamp gains a digit.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId {
    kind: CommitKind,
    timestamp: u64,
    hash: Option<ContentHash>,
}

/// Error returned when a commit id (or one of its parts) is malformed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid commit id {value:?}: {reason}")]
pub struct CommitIdError {
    /// The rejected value.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

impl CommitIdError {
    fn new(value: &str, reason: impl Into<String>) -> Self {
        Self {
            value: value.to_owned(),
            reason: reason.into(),
        }
    }
}

impl CommitId {
    /// Id of a diff commit whose new content hashes to `hash`.
    #[must_use]
    pub const fn diff(timestamp: u64, hash: ContentHash) -> Self {
        Self {
            kind: CommitKind::Diff,
            timestamp,
            hash: Some(hash),
        }
    }

    /// Id of a binary commit whose content hashes to `hash`.
    #[must_use]
    pub const fn binary(timestamp: u64, hash: ContentHash) -> Self {
        Self {
            kind: CommitKind::Binary,
            timestamp,
            hash: Some(hash),
        }
    }

    /// Id of a deletion marker.
    #[must_use]
    pub const fn deletion(timestamp: u64) -> Self {
        Self {
            kind: CommitKind::Deletion,
            timestamp,
            hash: None,
        }
    }

    /// The commit kind.
    #[must_use]
    pub const fn kind(&self) -> CommitKind {
        self.kind
    }

    /// Unix timestamp (seconds) of the orchestration pass.
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Hash of the new content; `None` for deletion markers.
    #[must_use]
    pub const fn hash(&self) -> Option<&ContentHash> {
        self.hash.as_ref()
    }

    /// Parse and validate a serialized commit id.
    ///
    /// # Errors
    /// Returns [`CommitIdError`] on an unknown kind character, a missing or
    /// non-numeric timestamp, a missing `+` separator, or a suffix that is
    /// neither a 64-char hex digest nor `deleted` (the latter only for `d`).
    pub fn parse(s: &str) -> Result<Self, CommitIdError> {
        let mut chars = s.chars();
        let kind_char = chars
            .next()
            .ok_or_else(|| CommitIdError::new(s, "commit id is empty"))?;
        let rest = chars.as_str();
        let (ts, suffix) = rest
            .split_once('+')
            .ok_or_else(|| CommitIdError::new(s, "missing '+' separator"))?;

        if ts.is_empty() || !ts.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CommitIdError::new(s, "timestamp must be decimal digits"));
        }
        if ts.len() > 1 && ts.starts_with('0') {
            return Err(CommitIdError::new(s, "timestamp must not have leading zeros"));
        }
        let timestamp: u64 = ts
            .parse()
            .map_err(|e| CommitIdError::new(s, format!("timestamp out of range: {e}")))?;

        match (kind_char, suffix) {
            ('d', DELETED_SUFFIX) => Ok(Self::deletion(timestamp)),
            ('d', hex) => Ok(Self::diff(timestamp, parse_hash(s, hex)?)),
            ('b', hex) => Ok(Self::binary(timestamp, parse_hash(s, hex)?)),
            (other, _) => Err(CommitIdError::new(
                s,
                format!("unknown commit kind '{other}' (expected 'd' or 'b')"),
            )),
        }
    }
}

fn parse_hash(id: &str, hex: &str) -> Result<ContentHash, CommitIdError> {
    ContentHash::from_hex(hex).map_err(|e| CommitIdError::new(id, e.reason))
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}+", self.kind.prefix(), self.timestamp)?;
        match &self.hash {
            Some(hash) => write!(f, "{hash}"),
            None => f.write_str(DELETED_SUFFIX),
        }
    }
}

impl fmt::Debug for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitId({self})")
    }
}

impl FromStr for CommitId {
    type Err = CommitIdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CommitId {
    type Error = CommitIdError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> Self {
        id.to_string()
    }
}

impl Ord for CommitId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.to_string().cmp(&other.to_string()))
    }
}

impl PartialOrd for CommitId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
