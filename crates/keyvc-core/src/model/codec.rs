//! Commit codec: the on-disk diff format.
//!
//! One operation per line, each terminated by `\n`:
//!
//! ```text
//! =1        copy base line 1
//! =2        copy base line 2
//! +D        insert the literal line "D"
//! ```
//!
//! Blank lines in a payload carry no operation and are skipped.

use thiserror::Error;

use super::diff::{EditOp, EditScript};

/// Errors raised while decoding or replaying a diff payload.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A `=` operation whose line number is missing, non-numeric or zero.
    #[error("unparsable line number in diff operation {raw:?}")]
    UnparsableLineNumber {
        /// The full operation line.
        raw: String,
    },

    /// A `=` operation pointing past the end of the base content.
    #[error("invalid line reference {line}: base content has {base_len} line(s)")]
    InvalidLineReference {
        /// The 1-based line that was requested.
        line: usize,
        /// Number of lines in the base.
        base_len: usize,
    },

    /// A line that starts with neither `=` nor `+`.
    #[error("malformed diff operation {line:?}")]
    MalformedOperation {
        /// The offending line.
        line: String,
    },

    /// The payload is not valid UTF-8.
    #[error("diff payload is not valid UTF-8")]
    InvalidUtf8,
}

/// Serialize a script, one operation per line.
#[must_use]
pub fn encode(script: &EditScript) -> Vec<u8> {
    let mut out = String::new();
    for op in script.ops() {
        match op {
            EditOp::Copy(n) => {
                out.push('=');
                out.push_str(&n.to_string());
            }
            EditOp::Insert(text) => {
                out.push('+');
                out.push_str(text);
            }
        }
        out.push('\n');
    }
    out.into_bytes()
}

/// Parse a diff payload back into a script.
///
/// # Errors
/// Returns [`CodecError`] on invalid UTF-8, an unparsable `=` line number or
/// a line with an unknown operation character.
pub fn decode(payload: &[u8]) -> Result<EditScript, CodecError> {
    let text = std::str::from_utf8(payload).map_err(|_| CodecError::InvalidUtf8)?;
    let mut ops = Vec::new();
    for line in text.split('\n') {
        if line.is_empty() {
            continue;
        }
        if let Some(num) = line.strip_prefix('=') {
            let n: usize = num.parse().map_err(|_| CodecError::UnparsableLineNumber {
                raw: line.to_owned(),
            })?;
            if n == 0 {
                return Err(CodecError::UnparsableLineNumber {
                    raw: line.to_owned(),
                });
            }
            ops.push(EditOp::Copy(n));
        } else if let Some(text) = line.strip_prefix('+') {
            ops.push(EditOp::Insert(text.to_owned()));
        } else {
            return Err(CodecError::MalformedOperation {
                line: line.to_owned(),
            });
        }
    }
    Ok(EditScript::new(ops))
}

/// Apply a script to base lines.
///
/// # Errors
/// Returns [`CodecError::InvalidLineReference`] when a copy points past the
/// end of `base`.
pub fn apply<S: AsRef<str>>(script: &EditScript, base: &[S]) -> Result<Vec<String>, CodecError> {
    let mut out = Vec::with_capacity(script.len());
    for op in script.ops() {
        match op {
            EditOp::Copy(n) => {
                let line = n
                    .checked_sub(1)
                    .and_then(|i| base.get(i))
                    .ok_or(CodecError::InvalidLineReference {
                        line: *n,
                        base_len: base.len(),
                    })?;
                out.push(line.as_ref().to_owned());
            }
            EditOp::Insert(text) => out.push(text.clone()),
        }
    }
    Ok(out)
}

/// Decode `payload` and apply it to `base`.
///
/// # Errors
/// Any [`decode`] or [`apply`] error.
pub fn replay<S: AsRef<str>>(payload: &[u8], base: &[S]) -> Result<Vec<String>, CodecError> {
    apply(&decode(payload)?, base)
}
