//! Cache error types.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache operation errors.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The named cache does not exist (or was deleted).
    #[error("no cache named {0:?}")]
    NoSuchCache(String),

    /// Cache names must be non-empty.
    #[error("invalid cache name {0:?}")]
    InvalidName(String),

    /// Only GET requests can be stored.
    #[error("cannot store {method} request for {url}")]
    UnsupportedMethod { method: String, url: String },

    /// Partial content responses are never stored.
    #[error("cannot store partial response (206) for {0}")]
    PartialResponse(String),

    /// Backend I/O failure.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A stored file could not be decoded.
    #[error("corrupt cache file {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to encode a cache entry.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
