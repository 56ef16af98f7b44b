//! Handle to a single named cache.

use std::sync::Arc;

use http::Method;
use precache_core::{Request, Response};

use crate::backend::{CacheBackend, CacheEntry};
use crate::error::{CacheError, CacheResult};
use crate::key::{MatchOptions, RequestKey};

/// A named cache of request/response pairs.
///
/// Cheap to clone; all clones share the same backend.
pub struct Cache<B: CacheBackend> {
    name: String,
    backend: Arc<B>,
}

impl<B: CacheBackend> Clone for Cache<B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: CacheBackend> Cache<B> {
    pub(crate) fn new(name: impl Into<String>, backend: Arc<B>) -> Self {
        Self {
            name: name.into(),
            backend,
        }
    }

    /// Cache name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First stored response matching the request.
    pub async fn match_request(
        &self,
        request: &Request,
        options: MatchOptions,
    ) -> CacheResult<Option<Response>> {
        if !options.accepts_method(request.method()) {
            return Ok(None);
        }

        let wanted = RequestKey::from_request(request);
        if !options.ignore_search {
            let entry = self.backend.get(&self.name, &wanted).await?;
            return Ok(entry.map(|e| e.response));
        }

        Ok(self
            .backend
            .entries(&self.name)
            .await?
            .into_iter()
            .find(|e| options.key_matches(&e.key, &wanted))
            .map(|e| e.response))
    }

    /// Every stored response matching the request.
    pub async fn match_all(
        &self,
        request: &Request,
        options: MatchOptions,
    ) -> CacheResult<Vec<Response>> {
        if !options.accepts_method(request.method()) {
            return Ok(Vec::new());
        }

        let wanted = RequestKey::from_request(request);
        Ok(self
            .backend
            .entries(&self.name)
            .await?
            .into_iter()
            .filter(|e| options.key_matches(&e.key, &wanted))
            .map(|e| e.response)
            .collect())
    }

    /// Store a single pair, replacing any existing entry for the request.
    pub async fn put(&self, request: &Request, response: Response) -> CacheResult<()> {
        self.put_all(vec![(request.clone(), response)]).await
    }

    /// Store several pairs as one batch.
    ///
    /// Every pair is validated before anything is written; if one is
    /// rejected, none are stored.
    pub async fn put_all(&self, pairs: Vec<(Request, Response)>) -> CacheResult<()> {
        let mut entries = Vec::with_capacity(pairs.len());
        for (request, response) in pairs {
            check_storable(&request, &response)?;
            entries.push(CacheEntry::new(RequestKey::from_request(&request), response));
        }

        let count = entries.len();
        self.backend.put_batch(&self.name, entries).await?;
        tracing::debug!(cache = %self.name, count, "stored cache entries");
        Ok(())
    }

    /// Remove entries matching the request. Returns `true` if any was removed.
    pub async fn delete(&self, request: &Request, options: MatchOptions) -> CacheResult<bool> {
        if !options.accepts_method(request.method()) {
            return Ok(false);
        }

        let wanted = RequestKey::from_request(request);
        if !options.ignore_search {
            return self.backend.remove(&self.name, &wanted).await;
        }

        let mut removed = false;
        for entry in self.backend.entries(&self.name).await? {
            if options.key_matches(&entry.key, &wanted) {
                removed |= self.backend.remove(&self.name, &entry.key).await?;
            }
        }
        Ok(removed)
    }

    /// Keys of all stored requests, in insertion order.
    pub async fn keys(&self) -> CacheResult<Vec<RequestKey>> {
        Ok(self
            .backend
            .entries(&self.name)
            .await?
            .into_iter()
            .map(|e| e.key)
            .collect())
    }

    /// All stored entries, in insertion order.
    pub async fn entries(&self) -> CacheResult<Vec<CacheEntry>> {
        self.backend.entries(&self.name).await
    }
}

fn check_storable(request: &Request, response: &Response) -> CacheResult<()> {
    if *request.method() != Method::GET {
        return Err(CacheError::UnsupportedMethod {
            method: request.method().to_string(),
            url: request.url().to_string(),
        });
    }
    if response.status == 206 {
        return Err(CacheError::PartialResponse(request.url().to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use url::Url;

    fn get(path: &str) -> Request {
        Request::get(Url::parse("http://localhost:5000").unwrap().join(path).unwrap())
    }

    async fn cache() -> Cache<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        backend.open("v1").await.unwrap();
        Cache::new("v1", backend)
    }

    #[tokio::test]
    async fn test_put_then_match() {
        let cache = cache().await;
        cache.put(&get("/"), Response::ok("home")).await.unwrap();

        let hit = cache
            .match_request(&get("/"), MatchOptions::default())
            .await
            .unwrap();
        assert_eq!(hit.unwrap().text(), "home");

        let miss = cache
            .match_request(&get("/other.png"), MatchOptions::default())
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_fragment_ignored_on_lookup() {
        let cache = cache().await;
        cache.put(&get("/index.html"), Response::ok("page")).await.unwrap();

        let hit = cache
            .match_request(&get("/index.html#menu"), MatchOptions::default())
            .await
            .unwrap();
        assert!(hit.is_some());
    }

    #[tokio::test]
    async fn test_post_never_matches_by_default() {
        let cache = cache().await;
        cache.put(&get("/api"), Response::ok("cached")).await.unwrap();

        let post = Request::new(Method::POST, get("/api").url().clone());
        assert!(cache
            .match_request(&post, MatchOptions::default())
            .await
            .unwrap()
            .is_none());
        assert!(cache
            .match_request(&post, MatchOptions::new().ignore_method())
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_ignore_search() {
        let cache = cache().await;
        cache.put(&get("/app.js?v=1"), Response::ok("v1")).await.unwrap();
        cache.put(&get("/app.js?v=2"), Response::ok("v2")).await.unwrap();

        let exact = cache
            .match_request(&get("/app.js"), MatchOptions::default())
            .await
            .unwrap();
        assert!(exact.is_none());

        let loose = cache
            .match_request(&get("/app.js"), MatchOptions::new().ignore_search())
            .await
            .unwrap();
        assert_eq!(loose.unwrap().text(), "v1");

        let all = cache
            .match_all(&get("/app.js"), MatchOptions::new().ignore_search())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_put_all_rejects_whole_batch() {
        let cache = cache().await;
        let post = Request::new(Method::POST, get("/form").url().clone());

        let result = cache
            .put_all(vec![
                (get("/"), Response::ok("home")),
                (post, Response::ok("form")),
            ])
            .await;

        assert!(matches!(result, Err(CacheError::UnsupportedMethod { .. })));
        assert!(cache.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_content_rejected() {
        let cache = cache().await;
        let result = cache.put(&get("/video.mp4"), Response::new(206, "part")).await;
        assert!(matches!(result, Err(CacheError::PartialResponse(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = cache().await;
        cache.put(&get("/a?x=1"), Response::ok("a")).await.unwrap();
        cache.put(&get("/a?x=2"), Response::ok("a")).await.unwrap();
        cache.put(&get("/b"), Response::ok("b")).await.unwrap();

        assert!(cache.delete(&get("/b"), MatchOptions::default()).await.unwrap());
        assert!(cache
            .delete(&get("/a"), MatchOptions::new().ignore_search())
            .await
            .unwrap());
        assert!(cache.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_in_insertion_order() {
        let cache = cache().await;
        cache.put(&get("/b"), Response::ok("")).await.unwrap();
        cache.put(&get("/a"), Response::ok("")).await.unwrap();

        let keys: Vec<String> = cache
            .keys()
            .await
            .unwrap()
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["http://localhost:5000/b", "http://localhost:5000/a"]);
    }
}
