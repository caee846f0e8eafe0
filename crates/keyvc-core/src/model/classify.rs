//! Text vs binary classification.

/// Number of leading bytes inspected by [`is_binary`].
pub const BINARY_PROBE_LEN: usize = 8000;

/// Return `true` if any of the first [`BINARY_PROBE_LEN`] bytes is zero.
#[must_use]
pub fn is_binary(data: &[u8]) -> bool {
    let end = data.len().min(BINARY_PROBE_LEN);
    data[..end].contains(&0)
}

/// Scanned file content, classified once per orchestration pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    /// UTF-8 text with no NUL byte in the probed prefix.
    Text(String),
    /// Anything else; stored as a full copy.
    Binary(Vec<u8>),
}

impl Content {
    /// Classify raw bytes.
    ///
    /// Content is binary when [`is_binary`] says so, and also when it is not
    /// valid UTF-8, since line diffs operate on strings.
    #[must_use]
    pub fn classify(bytes: Vec<u8>) -> Self {
        if is_binary(&bytes) {
            return Self::Binary(bytes);
        }
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(e) => Self::Binary(e.into_bytes()),
        }
    }

    /// Raw bytes of the content.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// `true` for [`Content::Binary`].
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_byte_in_prefix_is_binary() {
        assert!(is_binary(b"PNG\0\x01\x02"));
        assert!(!is_binary(b"plain text\n"));
        assert!(!is_binary(b""));
    }

    #[test]
    fn zero_byte_past_probe_window_is_ignored() {
        let mut data = vec![b'a'; BINARY_PROBE_LEN];
        data.push(0);
        assert!(!is_binary(&data));

        data[BINARY_PROBE_LEN - 1] = 0;
        assert!(is_binary(&data));
    }

    #[test]
    fn invalid_utf8_is_classified_binary() {
        let content = Content::classify(vec![0xff, 0xfe, b'a']);
        assert!(content.is_binary());
        assert_eq!(content.as_bytes(), &[0xff, 0xfe, b'a']);
    }

    #[test]
    fn utf8_text_is_classified_text() {
        let content = Content::classify("héllo\nworld".as_bytes().to_vec());
        assert_eq!(content, Content::Text("héllo\nworld".to_owned()));
    }
}
