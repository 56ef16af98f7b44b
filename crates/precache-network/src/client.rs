//! Live network client.

use std::collections::BTreeMap;

use async_trait::async_trait;
use precache_core::{NetworkConfig, Request, Response};

use crate::error::NetworkError;

/// Anything that can turn a request into a response.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform one fetch. Non-2xx responses are `Ok`.
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

#[async_trait]
impl<N: Network + ?Sized> Network for std::sync::Arc<N> {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        (**self).fetch(request).await
    }
}

/// HTTP client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    /// Build a client from network settings.
    pub fn new(config: &NetworkConfig) -> Result<Self, NetworkError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| NetworkError::Request(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = builder.send().await.map_err(classify)?;

        let status = resp.status();
        let final_url = resp.url().to_string();
        let headers: BTreeMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = resp
            .bytes()
            .await
            .map_err(|e| NetworkError::Body(e.to_string()))?;

        tracing::debug!(
            url = %request.url(),
            status = status.as_u16(),
            bytes = body.len(),
            "network fetch complete"
        );

        let mut response = Response::new(status.as_u16(), body.to_vec()).with_url(final_url);
        response.headers = headers;
        Ok(response)
    }
}

fn classify(err: reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout(err.to_string())
    } else if err.is_connect() {
        NetworkError::Connection(err.to_string())
    } else {
        NetworkError::Request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_from_config() {
        let config = NetworkConfig {
            user_agent: "precache-test".to_string(),
            timeout_secs: Some(5),
        };
        assert!(HttpNetwork::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let network = HttpNetwork::with_client(
            reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
        );
        let request = Request::parse_get(&format!("http://127.0.0.1:{port}/")).unwrap();
        assert!(network.fetch(&request).await.is_err());
    }
}
