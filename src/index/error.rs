use thiserror::Error;

/// Result alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

#[derive(Debug, Error)]
/// Errors returned by watchlist index operations.
pub enum IndexError {
    /// Could not connect to the index endpoint.
    #[error("failed to connect to index at '{url}': {message}")]
    ConnectionFailed {
        /// Endpoint URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// A retrieval query failed.
    #[error("failed to search '{collection}': {message}")]
    SearchFailed {
        /// Collection name.
        collection: String,
        /// Error message.
        message: String,
    },

    /// The backend did not answer within its deadline.
    #[error("index query against '{collection}' timed out after {elapsed_ms}ms")]
    Timeout {
        /// Collection name.
        collection: String,
        /// Deadline that expired, in milliseconds.
        elapsed_ms: u64,
    },

    /// Query vector dimension mismatch.
    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },
}

impl IndexError {
    /// Whether this error is a deadline expiry.
    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
