//! Install-time asset population.

use futures::future::try_join_all;
use precache_cache::{CacheBackend, CacheStorage};
use precache_core::{CacheProfile, Request, Response};
use precache_network::Network;
use serde::Serialize;
use url::Url;

use crate::error::WorkerError;

/// Summary of a completed install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Cache the assets were written to.
    pub cache_name: String,
    /// Stored request URLs, in asset-list order.
    pub assets: Vec<String>,
    /// Total body bytes stored.
    pub bytes: u64,
}

/// Fetch every asset of `profile` and store them in its cache.
///
/// The cache is opened (created if absent) first. All assets are fetched
/// concurrently; the first network error or non-OK status aborts the
/// install and nothing is written. On success every asset is written in a
/// single batch, replacing earlier entries for the same URLs.
pub async fn precache<B, N>(
    storage: &CacheStorage<B>,
    network: &N,
    profile: &CacheProfile,
) -> Result<InstallReport, WorkerError>
where
    B: CacheBackend,
    N: Network + ?Sized,
{
    let urls = profile.resolve_assets()?;
    let cache = storage.open(&profile.cache_name).await?;

    let pairs = try_join_all(urls.into_iter().map(|url| fetch_asset(network, url))).await?;

    let report = InstallReport {
        cache_name: cache.name().to_string(),
        assets: pairs.iter().map(|(req, _)| req.url().to_string()).collect(),
        bytes: pairs.iter().map(|(_, resp)| resp.body.len() as u64).sum(),
    };

    cache.put_all(pairs).await?;
    Ok(report)
}

async fn fetch_asset<N>(network: &N, url: Url) -> Result<(Request, Response), WorkerError>
where
    N: Network + ?Sized,
{
    let request = Request::get(url);
    let response = network
        .fetch(&request)
        .await
        .map_err(|source| WorkerError::AssetFetch {
            url: request.url().to_string(),
            source,
        })?;

    if !response.is_ok() {
        return Err(WorkerError::AssetStatus {
            url: request.url().to_string(),
            status: response.status,
        });
    }

    tracing::debug!(url = %request.url(), bytes = response.body.len(), "fetched asset");
    Ok((request, response))
}
