//! Status command - show caches and worker state.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::StatusArgs;
use crate::context::Context;
use crate::output::{format_bytes, state_badge};

#[derive(Serialize)]
struct CacheSummary {
    name: String,
    state: precache_core::WorkerState,
    entries: usize,
    bytes: u64,
    updated_at: Option<DateTime<Utc>>,
    urls: Vec<String>,
}

/// Run the status command.
pub async fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let storage = ctx.storage().await?;
    let records = ctx.records().load()?;

    let mut summaries = Vec::new();
    for name in storage.keys().await? {
        let entries = storage.open(&name).await?.entries().await?;
        let record = records.iter().find(|r| r.cache_name == name);
        summaries.push(CacheSummary {
            state: record.map(|r| r.state).unwrap_or_default(),
            entries: entries.len(),
            bytes: entries.iter().map(|e| e.response.body.len() as u64).sum(),
            updated_at: entries.iter().map(|e| e.stored_at).max(),
            urls: entries.iter().map(|e| e.key.to_string()).collect(),
            name,
        });
    }

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "storage": ctx.storage_dir(),
            "config": ctx.config_path,
            "caches": summaries,
        }));
        return Ok(());
    }

    ctx.output.header("Precache Status");
    ctx.output.kv("Storage", &ctx.storage_dir().display().to_string());
    match &ctx.config_path {
        Some(path) => ctx.output.kv("Config", &path.display().to_string()),
        None => ctx.output.kv("Config", "(defaults)"),
    }

    if summaries.is_empty() {
        ctx.output.info("No caches yet. Run `precache install`.");
        return Ok(());
    }

    ctx.output.header("Caches");
    let widths = [24, 12, 8, 10, 20];
    ctx.output
        .table_row(&["NAME", "WORKER", "ENTRIES", "SIZE", "UPDATED"], &widths);
    for summary in &summaries {
        let entries = summary.entries.to_string();
        let size = format_bytes(summary.bytes);
        let updated = summary
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        ctx.output.table_row(
            &[
                summary.name.as_str(),
                summary.state.as_str(),
                entries.as_str(),
                size.as_str(),
                updated.as_str(),
            ],
            &widths,
        );
    }

    for summary in summaries.iter().filter(|s| s.state.is_controlling()) {
        ctx.output.success(&format!(
            "{} is {}",
            summary.name,
            state_badge(summary.state)
        ));
    }

    if args.entries {
        for summary in &summaries {
            ctx.output.header(&summary.name);
            for url in &summary.urls {
                ctx.output.list_item(url);
            }
        }
    }

    Ok(())
}
