//! Error types for the biblio-proto crate.

use thiserror::Error;

/// Errors that can occur while building, encoding or reading messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtoError {
    /// Failed to encode a message.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to decode a message.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Content payload could not be read as the expected shape.
    #[error("malformed content: expected {expected}, got {found:?}")]
    Malformed {
        /// Shape the reader expected.
        expected: &'static str,
        /// What was actually found.
        found: String,
    },

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(String),
}

impl ProtoError {
    /// Shorthand for a [`ProtoError::Malformed`] error.
    pub fn malformed(expected: &'static str, found: impl Into<String>) -> Self {
        Self::Malformed {
            expected,
            found: found.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display_includes_payload() {
        let err = ProtoError::malformed("title:count", "Dune:x");
        assert_eq!(
            err.to_string(),
            "malformed content: expected title:count, got \"Dune:x\""
        );
    }

    #[test]
    fn validation_display() {
        let err = ProtoError::Validation("empty wanted list".to_string());
        assert_eq!(err.to_string(), "validation error: empty wanted list");
    }
}
