//! Install command - pre-cache a profile and activate its worker.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use precache_core::{TracingObserver, WorkerState};
use precache_network::Network;
use precache_worker::{InstallReport, ServiceWorker};

use super::InstallArgs;
use crate::context::Context;
use crate::output::{format_bytes, state_badge};

/// Run the install command.
pub async fn run(args: InstallArgs, ctx: &Context) -> Result<()> {
    let (report, state) = install_with(ctx, args.profile.as_deref(), ctx.network()?).await?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "cache_name": report.cache_name,
            "state": state,
            "assets": report.assets,
            "bytes": report.bytes,
        }));
        return Ok(());
    }

    ctx.output.success(&format!(
        "Cached {} assets ({})",
        report.assets.len(),
        format_bytes(report.bytes)
    ));
    ctx.output.kv("Cache", &report.cache_name);
    ctx.output.kv("State", &state_badge(state));
    for asset in &report.assets {
        ctx.output.list_item(asset);
    }

    Ok(())
}

/// Install and activate a profile's worker over `network`, recording the
/// state it reaches.
pub(crate) async fn install_with<N: Network>(
    ctx: &Context,
    profile: Option<&str>,
    network: N,
) -> Result<(InstallReport, WorkerState)> {
    let profile = ctx.config.profile(profile)?.clone();
    let records = ctx.records();

    ctx.output.header(&format!("Installing {}", profile.cache_name));

    ctx.output.step(1, 3, "Validating asset list...");
    profile
        .validate()
        .with_context(|| format!("Profile {} is invalid", profile.cache_name))?;
    ctx.output.debug(&format!("{} assets", profile.assets.len()));

    ctx.output.step(2, 3, "Fetching assets...");
    let worker = ServiceWorker::new(profile, ctx.storage().await?, network)
        .with_observer(Arc::new(TracingObserver));

    let spinner = ctx.output.spinner("Pre-caching...");
    let result = worker.install().await;
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            let cache_name = &worker.profile().cache_name;
            let kept = records.record_failure(cache_name, worker.state())?;
            if kept.is_controlling() {
                ctx.output
                    .warn(&format!("Keeping the active worker for {}", cache_name));
            }
            return Err(e).context("Install failed");
        }
    };

    ctx.output.step(3, 3, "Activating...");
    worker.activate().await?;
    records.record(&report.cache_name, worker.state())?;

    Ok((report, worker.state()))
}
