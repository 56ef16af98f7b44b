//! Request keys and matching rules.

use std::fmt;

use http::Method;
use precache_core::Request;
use serde::{Deserialize, Serialize};
use url::Url;

/// The identity of a stored request: its absolute URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestKey(String);

impl RequestKey {
    /// Build a key from a URL, dropping the fragment.
    pub fn from_url(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self(url.into())
    }

    /// Build a key from a request.
    pub fn from_request(request: &Request) -> Self {
        Self::from_url(request.url())
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key with its query string removed.
    pub fn without_search(&self) -> &str {
        match self.0.find('?') {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Request> for RequestKey {
    fn from(request: &Request) -> Self {
        Self::from_request(request)
    }
}

/// Options controlling how a request is matched against stored entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Ignore the query string on both sides.
    pub ignore_search: bool,
    /// Match regardless of request method.
    pub ignore_method: bool,
}

impl MatchOptions {
    /// Default options: exact URL, GET only.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_search(mut self) -> Self {
        self.ignore_search = true;
        self
    }

    pub fn ignore_method(mut self) -> Self {
        self.ignore_method = true;
        self
    }

    /// Whether a request with this method may match at all.
    pub fn accepts_method(&self, method: &Method) -> bool {
        self.ignore_method || *method == Method::GET
    }

    /// Whether `stored` satisfies a lookup for `wanted`.
    pub fn key_matches(&self, stored: &RequestKey, wanted: &RequestKey) -> bool {
        if self.ignore_search {
            stored.without_search() == wanted.without_search()
        } else {
            stored == wanted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(url: &str) -> RequestKey {
        RequestKey::from_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_fragment_dropped() {
        assert_eq!(
            key("http://localhost:5000/index.html#main").as_str(),
            "http://localhost:5000/index.html"
        );
    }

    #[test]
    fn test_root_path_normalized() {
        assert_eq!(key("http://localhost:5000").as_str(), "http://localhost:5000/");
    }

    #[test]
    fn test_search_significant_by_default() {
        let opts = MatchOptions::default();
        assert!(!opts.key_matches(&key("http://a/x?v=1"), &key("http://a/x?v=2")));
        assert!(opts.key_matches(&key("http://a/x?v=1"), &key("http://a/x?v=1")));
    }

    #[test]
    fn test_ignore_search() {
        let opts = MatchOptions::new().ignore_search();
        assert!(opts.key_matches(&key("http://a/x?v=1"), &key("http://a/x")));
        assert!(!opts.key_matches(&key("http://a/x?v=1"), &key("http://a/y")));
    }

    #[test]
    fn test_method_filter() {
        let opts = MatchOptions::default();
        assert!(opts.accepts_method(&Method::GET));
        assert!(!opts.accepts_method(&Method::POST));
        assert!(!opts.accepts_method(&Method::HEAD));
        assert!(MatchOptions::new().ignore_method().accepts_method(&Method::POST));
    }
}
