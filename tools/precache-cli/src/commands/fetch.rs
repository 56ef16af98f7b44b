//! Fetch command - answer URLs cache-first.

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use precache_cache::MatchOptions;
use precache_core::Request;
use precache_network::Network;
use precache_worker::{CacheStatus, FetchInterceptor, FetchOutcome};
use serde::Serialize;

use super::FetchArgs;
use crate::context::Context;

#[derive(Serialize)]
struct FetchLine<'a> {
    url: String,
    source: CacheStatus,
    status: u16,
    cache: Option<&'a str>,
    content_type: Option<&'a str>,
    bytes: usize,
}

/// Run the fetch command.
pub async fn run(args: FetchArgs, ctx: &Context) -> Result<()> {
    if args.output.is_some() && args.urls.len() != 1 {
        bail!("--output needs exactly one URL");
    }

    let mut options = MatchOptions::default();
    if args.ignore_search {
        options = options.ignore_search();
    }
    let network = Arc::new(ctx.network()?);
    let outcomes = fetch_with(ctx, args.profile.as_deref(), &args.urls, options, network).await?;

    if let Some(path) = &args.output {
        if let Some((_, outcome)) = outcomes.first() {
            std::fs::write(path, outcome.response.bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            ctx.output.debug(&format!("Body written to {}", path.display()));
        }
    }

    if ctx.output.is_json() {
        let lines: Vec<FetchLine<'_>> = outcomes
            .iter()
            .map(|(request, outcome)| FetchLine {
                url: request.url().to_string(),
                source: outcome.status,
                status: outcome.response.status,
                cache: outcome.cache_name.as_deref(),
                content_type: outcome.response.content_type(),
                bytes: outcome.response.body.len(),
            })
            .collect();
        ctx.output.json(&lines);
        return Ok(());
    }

    for (request, outcome) in &outcomes {
        ctx.output.outcome(request, outcome);
    }
    Ok(())
}

/// Answer each URL through the profile's worker. The cache is consulted
/// only when the worker was recorded active; otherwise every request goes
/// to `network`.
pub(crate) async fn fetch_with<N: Network>(
    ctx: &Context,
    profile: Option<&str>,
    urls: &[String],
    options: MatchOptions,
    network: Arc<N>,
) -> Result<Vec<(Request, FetchOutcome)>> {
    let profile = ctx.config.profile(profile)?;
    let requests = urls
        .iter()
        .map(|raw| profile.resolve(raw).map(Request::get))
        .collect::<Result<Vec<_>, _>>()?;

    let state = ctx.records().state_of(&profile.cache_name)?;
    if !state.is_controlling() {
        ctx.output.warn(&format!(
            "Worker for {} is {}; requests go to the network. Run `precache install` first.",
            profile.cache_name, state
        ));
    }

    let interceptor =
        FetchInterceptor::new(ctx.storage().await?, network).with_match_options(options);

    let mut outcomes = Vec::with_capacity(requests.len());
    for request in requests {
        let result = if state.is_controlling() {
            interceptor.respond(&request).await
        } else {
            interceptor.passthrough(&request).await
        };
        let outcome = result.with_context(|| format!("Failed to fetch {}", request.url()))?;
        outcomes.push((request, outcome));
    }
    Ok(outcomes)
}
