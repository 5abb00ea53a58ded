//! Error types for the envelope layer.

use ledger_tx_core::CoreError;
use thiserror::Error;

/// Errors that can occur while serializing or deserializing an envelope.
#[derive(Debug, Error)]
pub enum Error {
    /// Error from the transaction codec.
    #[error("transaction error: {0}")]
    Core(#[from] CoreError),

    /// The envelope carries a format tag this crate does not know.
    #[error("unsupported envelope format 0x{0:04x}")]
    UnsupportedFormat(u16),

    /// zlib stream could not be written or read.
    #[error("compression error: {0}")]
    Compression(String),

    /// Decompressed payload exceeded the configured limit.
    #[error("decompressed payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Input shorter than the format tag.
    #[error("envelope too short: {0} bytes")]
    Truncated(usize),
}

/// Result type for envelope operations.
pub type Result<T> = std::result::Result<T, Error>;
