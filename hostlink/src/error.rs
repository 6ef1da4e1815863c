//! Error types for the stdio front end.

/// Errors in the newline-delimited stdio framing layer.
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    /// Input line exceeded the size limit.
    #[error("message exceeds maximum size of {max_bytes} bytes")]
    MessageTooLarge {
        /// The enforced limit.
        max_bytes: usize,
    },

    /// Input line was not valid JSON or not shaped like a request.
    #[error("malformed JSON-RPC message: {reason}")]
    MalformedJson {
        /// Parser diagnostic.
        reason: String,
    },

    /// Batch arrays are not part of this wire contract.
    #[error("JSON-RPC batch messages are not supported")]
    UnsupportedBatch,

    /// Underlying stdio failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
