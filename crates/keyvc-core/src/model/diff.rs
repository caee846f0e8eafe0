//! Line differs.
//!
//! An [`EditScript`] rebuilds the new text line by line from two operations:
//! copy a line of the base by its 1-based position, or insert a literal
//! line. There is no delete operation; base lines that are never copied are
//! dropped during replay.
//!
//! Two strategies produce scripts in this shape:
//!
//! - [`GreedyDiffer`] binds every new line to the *first* equal base line.
//!   This is the policy existing chains were written with; it is not a
//!   minimal diff and repeated base lines always resolve to the same
//!   position.
//! - [`LcsDiffer`] aligns the two texts along a longest common subsequence,
//!   so copies preserve base order and unmatched base lines are the ones
//!   dropped.
//!
//! Both replay through the same codec, so a chain may mix them.

use serde::{Deserialize, Serialize};

/// One replay operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOp {
    /// Copy base line `n` (1-based).
    Copy(usize),
    /// Append a literal line.
    Insert(String),
}

/// Ordered list of operations turning a base text into a new text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditScript {
    ops: Vec<EditOp>,
}

impl EditScript {
    /// Wrap a list of operations.
    #[must_use]
    pub const fn new(ops: Vec<EditOp>) -> Self {
        Self { ops }
    }

    /// The operations, in replay order.
    #[must_use]
    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    /// Number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// `true` if the script has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of [`EditOp::Insert`] operations.
    #[must_use]
    pub fn inserted_lines(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EditOp::Insert(_)))
            .count()
    }
}

impl From<Vec<EditOp>> for EditScript {
    fn from(ops: Vec<EditOp>) -> Self {
        Self::new(ops)
    }
}

/// Split text on `\n`. The empty string is one empty line and a trailing
/// newline produces a trailing empty line, so [`join_lines`] is an exact
/// inverse.
#[must_use]
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

/// Join lines with `\n`.
#[must_use]
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.as_ref());
    }
    out
}

/// A line-diff algorithm.
pub trait LineDiffer {
    /// Compute a script that rebuilds `new` from the lines of `old`.
    fn diff(&self, old: &str, new: &str) -> EditScript;
}

// ---------------------------------------------------------------------------
// GreedyDiffer
// ---------------------------------------------------------------------------

/// First-match differ used by existing chains.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyDiffer;

impl LineDiffer for GreedyDiffer {
    fn diff(&self, old: &str, new: &str) -> EditScript {
        let old_lines = split_lines(old);
        split_lines(new)
            .into_iter()
            .map(|line| {
                old_lines
                    .iter()
                    .position(|candidate| *candidate == line)
                    .map_or_else(|| EditOp::Insert(line.to_owned()), |i| EditOp::Copy(i + 1))
            })
            .collect::<Vec<_>>()
            .into()
    }
}

// ---------------------------------------------------------------------------
// LcsDiffer
// ---------------------------------------------------------------------------

/// Longest-common-subsequence differ.
#[derive(Clone, Copy, Debug, Default)]
pub struct LcsDiffer;

impl LineDiffer for LcsDiffer {
    fn diff(&self, old: &str, new: &str) -> EditScript {
        let a = split_lines(old);
        let b = split_lines(new);
        let (n, m) = (a.len(), b.len());

        // suffix[i][j] = LCS length of a[i..] and b[j..]
        let width = m + 1;
        let mut suffix = vec![0usize; (n + 1) * width];
        for i in (0..n).rev() {
            for j in (0..m).rev() {
                suffix[i * width + j] = if a[i] == b[j] {
                    suffix[(i + 1) * width + j + 1] + 1
                } else {
                    suffix[(i + 1) * width + j].max(suffix[i * width + j + 1])
                };
            }
        }

        let mut ops = Vec::with_capacity(m);
        let (mut i, mut j) = (0, 0);
        while i < n && j < m {
            if a[i] == b[j] {
                ops.push(EditOp::Copy(i + 1));
                i += 1;
                j += 1;
            } else if suffix[(i + 1) * width + j] >= suffix[i * width + j + 1] {
                i += 1;
            } else {
                ops.push(EditOp::Insert(b[j].to_owned()));
                j += 1;
            }
        }
        ops.extend(b[j..].iter().map(|line| EditOp::Insert((*line).to_owned())));
        ops.into()
    }
}

// ---------------------------------------------------------------------------
// DiffStrategy
// ---------------------------------------------------------------------------

/// Selectable differ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStrategy {
    /// [`GreedyDiffer`].
    #[default]
    Greedy,
    /// [`LcsDiffer`].
    Lcs,
}

impl DiffStrategy {
    /// The differ implementing this strategy.
    #[must_use]
    pub fn differ(self) -> &'static dyn LineDiffer {
        match self {
            Self::Greedy => &GreedyDiffer,
            Self::Lcs => &LcsDiffer,
        }
    }
}

impl std::fmt::Display for DiffStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Greedy => write!(f, "greedy"),
            Self::Lcs => write!(f, "lcs"),
        }
    }
}
