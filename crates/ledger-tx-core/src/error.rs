//! Error types for the ledger transaction core.

use thiserror::Error;

/// Errors raised while building, packing, unpacking or verifying a transaction.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A read ran past the end of the buffer.
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A Reference or Witness operation ran without its required links.
    #[error("not bound: {0}")]
    NotBound(&'static str),

    #[error("user is not an approver of the referenced event")]
    UnauthorizedApprover,

    #[error("signing failed")]
    SigningFailed,

    /// Signature verification failed at the given signature slot.
    #[error("signature verification failed at index {index}")]
    VerificationFailed { index: usize },

    #[error("transaction id mismatch: expected {expected}, got {actual}")]
    IdMismatch { expected: String, actual: String },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("asset body of {0} bytes exceeds the 65535 byte limit")]
    BodyTooLarge(usize),

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl CoreError {
    /// Whether this error was raised by the decoder on bad input bytes.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            CoreError::UnexpectedEof { .. } | CoreError::MalformedInput(_)
        )
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_classification() {
        assert!(CoreError::UnexpectedEof {
            needed: 4,
            remaining: 1
        }
        .is_malformed());
        assert!(CoreError::MalformedInput("x".into()).is_malformed());
        assert!(!CoreError::UnauthorizedApprover.is_malformed());
    }

    #[test]
    fn test_display_includes_index() {
        let msg = CoreError::VerificationFailed { index: 3 }.to_string();
        assert!(msg.contains('3'));
    }
}
