//! Network error types.

/// Error type for fetch operations.
///
/// An HTTP error status is not a `NetworkError`: the request completed and
/// the response is returned as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Body error: {0}")]
    Body(String),
}
