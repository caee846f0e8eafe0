//! Domain model types.

pub mod classify;
pub mod codec;
pub mod commit_id;
pub mod diff;
pub mod history;
pub mod key;

pub use classify::{BINARY_PROBE_LEN, Content, is_binary};
pub use codec::{CodecError, apply, decode, encode, replay};
pub use commit_id::{CommitId, CommitIdError, CommitKind, ContentHash};
pub use diff::{
    DiffStrategy, EditOp, EditScript, GreedyDiffer, LcsDiffer, LineDiffer, join_lines, split_lines,
};
pub use history::{CommitRef, HistoryEntry, HistoryError};
pub use key::{COMMITS_DIR, Key, KeyError};
