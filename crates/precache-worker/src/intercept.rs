//! Cache-first fetch interception.

use std::fmt;
use std::sync::Arc;

use precache_cache::{CacheBackend, CacheStorage, MatchOptions};
use precache_core::{Request, Response};
use precache_network::Network;
use serde::{Deserialize, Serialize};

use crate::error::WorkerError;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Served from a cache.
    Hit,
    /// No cached entry; fetched from the network.
    Miss,
    /// The worker was not controlling; fetched from the network.
    Bypass,
}

impl CacheStatus {
    /// Whether the response came from a cache.
    pub fn is_hit(&self) -> bool {
        *self == Self::Hit
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Bypass => write!(f, "BYPASS"),
        }
    }
}

/// The single response produced for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub response: Response,
    pub status: CacheStatus,
    /// Cache that answered, on a hit.
    pub cache_name: Option<String>,
}

/// Answers requests from cache storage, falling back to the network.
///
/// Network responses are returned unmodified and never written back.
pub struct FetchInterceptor<B: CacheBackend, N: Network> {
    storage: CacheStorage<B>,
    network: Arc<N>,
    options: MatchOptions,
}

impl<B: CacheBackend, N: Network> FetchInterceptor<B, N> {
    /// Create an interceptor with default match options.
    pub fn new(storage: CacheStorage<B>, network: Arc<N>) -> Self {
        Self {
            storage,
            network,
            options: MatchOptions::default(),
        }
    }

    /// Override the match options.
    pub fn with_match_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the match options.
    pub fn match_options(&self) -> MatchOptions {
        self.options
    }

    /// Cache-first: a stored response if any cache has one, otherwise
    /// exactly one network fetch.
    pub async fn respond(&self, request: &Request) -> Result<FetchOutcome, WorkerError> {
        if let Some(hit) = self.storage.match_request(request, self.options).await? {
            tracing::debug!(url = %request.url(), cache = %hit.cache_name, "cache hit");
            return Ok(FetchOutcome {
                response: hit.response,
                status: CacheStatus::Hit,
                cache_name: Some(hit.cache_name),
            });
        }

        tracing::debug!(url = %request.url(), "cache miss, fetching from network");
        let response = self.network.fetch(request).await?;
        Ok(FetchOutcome {
            response,
            status: CacheStatus::Miss,
            cache_name: None,
        })
    }

    /// Go straight to the network without consulting any cache.
    pub async fn passthrough(&self, request: &Request) -> Result<FetchOutcome, WorkerError> {
        tracing::debug!(url = %request.url(), "not controlling, bypassing cache");
        let response = self.network.fetch(request).await?;
        Ok(FetchOutcome {
            response,
            status: CacheStatus::Bypass,
            cache_name: None,
        })
    }
}
