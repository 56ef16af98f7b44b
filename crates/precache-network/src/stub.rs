//! Canned network for development and testing.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use precache_core::{Request, Response};

use crate::client::Network;
use crate::error::NetworkError;

/// Network that answers from a fixed routing table and records every call.
///
/// URLs without a route get a 404 response.
#[derive(Debug, Default)]
pub struct StubNetwork {
    routes: HashMap<String, Result<Response, NetworkError>>,
    calls: Mutex<Vec<String>>,
}

impl StubNetwork {
    /// Create an empty stub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with a response.
    pub fn with_response(mut self, url: impl Into<String>, response: Response) -> Self {
        self.routes.insert(url.into(), Ok(response));
        self
    }

    /// Answer `url` with a failure.
    pub fn with_error(mut self, url: impl Into<String>, error: NetworkError) -> Self {
        self.routes.insert(url.into(), Err(error));
        self
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Number of fetches so far.
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    /// Number of fetches of one URL.
    pub fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let url = request.url().to_string();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.clone());
        }

        match self.routes.get(&url) {
            Some(Ok(response)) => Ok(response.clone().with_url(url)),
            Some(Err(err)) => Err(err.clone()),
            None => Ok(Response::new(404, "Not Found").with_url(url)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_and_recording() {
        let network = StubNetwork::new()
            .with_response("http://a/", Response::ok("home"))
            .with_error("http://a/down", NetworkError::Connection("refused".into()));

        let home = network
            .fetch(&Request::parse_get("http://a/").unwrap())
            .await
            .unwrap();
        assert_eq!(home.text(), "home");

        let down = network
            .fetch(&Request::parse_get("http://a/down").unwrap())
            .await;
        assert!(matches!(down, Err(NetworkError::Connection(_))));

        let missing = network
            .fetch(&Request::parse_get("http://a/missing").unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status, 404);

        assert_eq!(network.call_count(), 3);
        assert_eq!(network.calls_to("http://a/"), 1);
    }
}
