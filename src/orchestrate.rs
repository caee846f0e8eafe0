//! Full commit orchestration.
//!
//! One pass works in two phases:
//!
//! 1. **Plan.** Scan the working tree and compare every file with the
//!    latest revision of its key. Nothing is written; the result is a
//!    [`CommitPlan`], which is also what `keyvc diff` prints.
//! 2. **Apply.** Under the commit lock, archive the chains of deleted keys
//!    and mark them, append the new commits, then record one history entry
//!    naming every commit in the order it was written.
//!
//! A failure during apply leaves already-written commits in place but
//! writes no history entry.

use std::collections::BTreeSet;
use std::path::Path;

use keyvc_core::model::{
    CommitId, CommitKind, CommitRef, Content, ContentHash, HistoryEntry, Key, LineDiffer,
};
use serde::Serialize;
use tracing::instrument;

use crate::chain::{CommitChain, CommitRecord};
use crate::clock::{Clock, pass_timestamp};
use crate::error::{Result, VcError};
use crate::history;
use crate::index::KeyIndex;
use crate::layout::{self, KEYS_DIR};
use crate::lock::CommitLock;
use crate::reconstruct::{cat, last_cat};
use crate::repo::Repository;
use crate::scan::TreeScanner;
use crate::store::BlobStore;

/// How a key changed since its latest commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// The key has no chain yet.
    Added,
    /// The content differs from the latest revision.
    Modified,
    /// The key has a chain but is gone from the working tree.
    Deleted,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        })
    }
}

/// One key's pending commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedChange {
    /// The key.
    pub key: Key,
    /// What happened to it.
    pub kind: ChangeKind,
    /// The commit to write.
    pub record: CommitRecord,
}

/// Printable summary of a [`StagedChange`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    /// The key.
    pub key: Key,
    /// What happened to it.
    pub change: ChangeKind,
    /// Kind of the commit that would be written.
    pub commit: CommitKind,
    /// Lines inserted by a diff commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_lines: Option<usize>,
}

impl StagedChange {
    /// Summary for display.
    #[must_use]
    pub fn summary(&self) -> ChangeSummary {
        let inserted_lines = match &self.record {
            CommitRecord::Diff { script, .. } => Some(script.inserted_lines()),
            _ => None,
        };
        ChangeSummary {
            key: self.key.clone(),
            change: self.kind,
            commit: self.record.kind(),
            inserted_lines,
        }
    }
}

/// Everything one pass would commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitPlan {
    /// Shared timestamp of every commit in the pass.
    pub timestamp: u64,
    /// Additions and modifications in scan order, then deletions in key
    /// order.
    pub changes: Vec<StagedChange>,
}

impl CommitPlan {
    /// `true` if the pass would write nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Summaries of every change, in plan order.
    #[must_use]
    pub fn summaries(&self) -> Vec<ChangeSummary> {
        self.changes.iter().map(StagedChange::summary).collect()
    }
}

/// Decide the commit for one scanned file, or `None` if it is unchanged.
fn stage_file<S: BlobStore>(
    chain: &CommitChain<'_, S>,
    differ: &dyn LineDiffer,
    key: Key,
    bytes: Vec<u8>,
) -> Result<Option<StagedChange>> {
    let content = Content::classify(bytes);
    let latest = chain.latest(&key)?;
    if let Some(latest) = &latest
        && latest.hash() == Some(&ContentHash::of(content.as_bytes()))
    {
        return Ok(None);
    }

    let kind = if latest.is_some() {
        ChangeKind::Modified
    } else {
        ChangeKind::Added
    };
    let record = match (content, latest.as_ref().map(CommitId::kind)) {
        (Content::Binary(bytes), _) => CommitRecord::binary(bytes),
        (Content::Text(text), None) => CommitRecord::text_snapshot(differ, "", &text),
        (Content::Text(text), Some(CommitKind::Binary)) => {
            // Diff against the last text revision, which may equal `text`.
            let base = cat(chain, &key, None)?;
            CommitRecord::text_snapshot(differ, &base, &text)
        }
        (Content::Text(text), Some(_)) => {
            let base = last_cat(chain, &key)?;
            match CommitRecord::diff(&key, differ, &base, &text) {
                Ok(record) => record,
                Err(e) if e.is_noop() => return Ok(None),
                Err(e) => return Err(e),
            }
        }
    };
    Ok(Some(StagedChange { key, kind, record }))
}

/// Compare the working tree with the latest revisions. Writes nothing.
///
/// # Errors
/// Scan, index or reconstruction failures.
#[instrument(skip_all, fields(timestamp = timestamp))]
pub fn plan<S: BlobStore>(repo: &Repository<S>, timestamp: u64) -> Result<CommitPlan> {
    let store = repo.store();
    let chain = CommitChain::live(store);
    let differ = repo.differ();
    let known = KeyIndex::load(store, Path::new(KEYS_DIR))?;
    let scanner = TreeScanner::new(repo.worktree(), &repo.config().scan)?;

    let mut seen = BTreeSet::new();
    let mut changes = Vec::new();
    for file in scanner.scan()? {
        seen.insert(file.key.clone());
        if let Some(change) = stage_file(&chain, differ, file.key, file.bytes)? {
            changes.push(change);
        }
    }
    for key in known.into_iter().filter(|key| !seen.contains(key)) {
        changes.push(StagedChange {
            key,
            kind: ChangeKind::Deleted,
            record: CommitRecord::Deletion,
        });
    }

    tracing::debug!(changes = changes.len(), "commit plan ready");
    Ok(CommitPlan { timestamp, changes })
}

/// Write a plan's commits and its history entry.
///
/// Deletions go first: a key's chain must leave `keys/` before a new key
/// can be created below its path (a file replaced by a directory of the
/// same name).
fn apply<S: BlobStore>(
    repo: &Repository<S>,
    plan: CommitPlan,
    message: &str,
) -> Result<HistoryEntry> {
    let store = repo.store();
    let ts = plan.timestamp;
    let live = CommitChain::live(store);
    let archive = CommitChain::archived(store, ts);

    let (deletions, changes): (Vec<_>, Vec<_>) = plan
        .changes
        .into_iter()
        .partition(|change| change.kind == ChangeKind::Deleted);

    let mut commits = Vec::new();
    for change in deletions {
        let from = live.key_dir(&change.key);
        let to = archive.key_dir(&change.key);
        store.rename(&from, &to).map_err(|e| VcError::io(&from, e))?;
        let id = match archive.append(&change.key, &change.record, ts) {
            Ok(id) => id,
            Err(err) => {
                // An archived chain without its marker must not survive.
                if let Err(e) = store.rename(&to, &from) {
                    tracing::error!(
                        key = %change.key,
                        error = %e,
                        "failed to restore chain after marker write failed"
                    );
                }
                return Err(err);
            }
        };
        tracing::info!(key = %change.key, archive = %layout::archive_root(ts).display(), "key deleted");
        commits.push(CommitRef::new(change.key, id));
    }
    for change in changes {
        let id = live.append(&change.key, &change.record, ts)?;
        tracing::info!(key = %change.key, commit = %id, change = %change.kind, "key committed");
        commits.push(CommitRef::new(change.key, id));
    }

    let entry = HistoryEntry {
        timestamp: ts,
        message: message.to_owned(),
        commits,
    };
    history::write_entry(store, &entry)?;
    Ok(entry)
}

/// Commit every change in the working tree as one history entry.
///
/// # Errors
/// [`VcError::CommitInProgress`] if the lock is held,
/// [`VcError::NothingToCommit`] if nothing changed, or any failure while
/// planning or writing.
#[instrument(skip_all)]
pub fn full_commit<S: BlobStore>(
    repo: &Repository<S>,
    message: &str,
    clock: &dyn Clock,
) -> Result<HistoryEntry> {
    let _lock = CommitLock::acquire(repo.store())?;
    let ts = pass_timestamp(clock, history::latest_timestamp(repo.store())?);
    let plan = plan(repo, ts)?;
    if plan.is_empty() {
        return Err(VcError::NothingToCommit);
    }
    let entry = apply(repo, plan, message)?;
    tracing::info!(
        timestamp = entry.timestamp,
        commits = entry.commits.len(),
        "full commit recorded"
    );
    Ok(entry)
}
