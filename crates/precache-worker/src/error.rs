//! Worker error types.

use precache_cache::CacheError;
use precache_core::{ConfigError, LifecycleError};
use precache_network::NetworkError;
use thiserror::Error;

/// Errors surfaced by install and fetch handling.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// The profile could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The signal is not valid in the current lifecycle state.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Cache storage failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A fetch missed the cache and the network failed.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// An asset could not be fetched during install.
    #[error("failed to fetch asset {url}: {source}")]
    AssetFetch {
        url: String,
        #[source]
        source: NetworkError,
    },

    /// An asset answered with a non-OK status during install.
    #[error("asset {url} returned HTTP {status}")]
    AssetStatus { url: String, status: u16 },
}
