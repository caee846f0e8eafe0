//! Revision reconstruction.
//!
//! Text is rebuilt by replaying every diff commit of a chain, oldest first,
//! starting from a single empty line. Binary commits and deletion markers
//! carry no text and are stepped over, so replay after a binary stretch
//! resumes from the last text revision.

use keyvc_core::model::{CommitId, CommitKind, Key, join_lines, replay};
use tracing::instrument;

use crate::chain::CommitChain;
use crate::error::{Result, VcError};
use crate::store::BlobStore;

/// A materialized revision of one key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Revision {
    /// Text rebuilt from the diff commits.
    Text(String),
    /// Bytes of a binary commit.
    Binary(Vec<u8>),
}

impl Revision {
    /// Raw bytes of the revision.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Consume into raw bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }
}

/// Commits of `key`, plus the index of `upto` (or of the last commit).
fn chain_upto<S: BlobStore>(
    chain: &CommitChain<'_, S>,
    key: &Key,
    upto: Option<&CommitId>,
) -> Result<(Vec<CommitId>, usize)> {
    let ids = chain.list(key)?;
    if ids.is_empty() {
        return Err(VcError::KeyNotFound { key: key.clone() });
    }
    let end = match upto {
        None => ids.len() - 1,
        Some(target) => ids
            .iter()
            .position(|id| id == target)
            .ok_or_else(|| VcError::CommitNotFound {
                key: key.clone(),
                commit: target.clone(),
            })?,
    };
    Ok((ids, end))
}

fn replay_text<S: BlobStore>(
    chain: &CommitChain<'_, S>,
    key: &Key,
    ids: &[CommitId],
) -> Result<String> {
    let mut lines = vec![String::new()];
    for id in ids.iter().filter(|id| id.kind() == CommitKind::Diff) {
        let payload = chain.read(key, id)?;
        lines = replay(&payload, &lines).map_err(|source| VcError::Codec {
            key: key.clone(),
            commit: id.clone(),
            source,
        })?;
    }
    Ok(join_lines(&lines))
}

/// Text of `key` after replaying its chain up to and including `upto`
/// (the whole chain when `None`).
///
/// # Errors
/// [`VcError::KeyNotFound`] for a key with no commits,
/// [`VcError::CommitNotFound`] when `upto` is not in the chain, and
/// [`VcError::Codec`] when a stored diff cannot be replayed.
#[instrument(skip_all, fields(key = %key))]
pub fn cat<S: BlobStore>(
    chain: &CommitChain<'_, S>,
    key: &Key,
    upto: Option<&CommitId>,
) -> Result<String> {
    let (ids, end) = chain_upto(chain, key, upto)?;
    replay_text(chain, key, &ids[..=end])
}

/// Text of `key` after its whole chain.
///
/// # Errors
/// Same as [`cat`].
pub fn last_cat<S: BlobStore>(chain: &CommitChain<'_, S>, key: &Key) -> Result<String> {
    cat(chain, key, None)
}

/// Content of `key` at `upto` (or its latest commit), binary-aware.
///
/// The revision is decided by the last content commit at or before the
/// target: a binary commit yields its bytes, a diff commit yields the
/// replayed text. Deletion markers are stepped over.
///
/// # Errors
/// Same as [`cat`], plus I/O errors reading a binary commit.
#[instrument(skip_all, fields(key = %key))]
pub fn materialize<S: BlobStore>(
    chain: &CommitChain<'_, S>,
    key: &Key,
    upto: Option<&CommitId>,
) -> Result<Revision> {
    let (ids, end) = chain_upto(chain, key, upto)?;
    let ids = &ids[..=end];
    let last_content = ids.iter().rev().find(|id| id.kind() != CommitKind::Deletion);
    match last_content {
        Some(id) if id.kind() == CommitKind::Binary => Ok(Revision::Binary(chain.read(key, id)?)),
        _ => replay_text(chain, key, ids).map(Revision::Text),
    }
}
