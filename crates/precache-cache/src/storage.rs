//! The set of named caches reachable by a worker.

use std::sync::Arc;

use precache_core::{Request, Response};

use crate::backend::CacheBackend;
use crate::cache::Cache;
use crate::error::{CacheError, CacheResult};
use crate::key::MatchOptions;

/// A response found by a storage-wide match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMatch {
    /// Cache the response came from.
    pub cache_name: String,
    /// The stored response.
    pub response: Response,
}

/// Named cache storage.
pub struct CacheStorage<B: CacheBackend> {
    backend: Arc<B>,
}

impl<B: CacheBackend> Clone for CacheStorage<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: CacheBackend> CacheStorage<B> {
    /// Create storage over a backend.
    pub fn new(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    /// Create storage over a shared backend.
    pub fn from_arc(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Get the backend.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Open the named cache, creating it if absent.
    pub async fn open(&self, name: &str) -> CacheResult<Cache<B>> {
        if name.trim().is_empty() {
            return Err(CacheError::InvalidName(name.to_string()));
        }

        if self.backend.open(name).await? {
            tracing::info!(cache = %name, "created cache");
        }
        Ok(Cache::new(name, Arc::clone(&self.backend)))
    }

    /// Whether the named cache exists.
    pub async fn has(&self, name: &str) -> CacheResult<bool> {
        self.backend.has(name).await
    }

    /// Delete the named cache. Returns `true` if it existed.
    pub async fn delete(&self, name: &str) -> CacheResult<bool> {
        let deleted = self.backend.delete(name).await?;
        if deleted {
            tracing::info!(cache = %name, "deleted cache");
        }
        Ok(deleted)
    }

    /// Names of all caches, oldest first.
    pub async fn keys(&self) -> CacheResult<Vec<String>> {
        self.backend.cache_names().await
    }

    /// Search every cache, oldest first, and return the first match.
    pub async fn match_request(
        &self,
        request: &Request,
        options: MatchOptions,
    ) -> CacheResult<Option<CacheMatch>> {
        if !options.accepts_method(request.method()) {
            return Ok(None);
        }

        for name in self.backend.cache_names().await? {
            let cache = Cache::new(name.as_str(), Arc::clone(&self.backend));
            if let Some(response) = cache.match_request(request, options).await? {
                return Ok(Some(CacheMatch {
                    cache_name: name,
                    response,
                }));
            }
        }
        Ok(None)
    }
}
