//! Caches command - list or delete caches.

use anyhow::{bail, Result};
use dialoguer::Confirm;

use super::{CachesArgs, CachesCommand};
use crate::context::Context;

/// Run the caches command.
pub async fn run(args: CachesArgs, ctx: &Context) -> Result<()> {
    match args.command {
        CachesCommand::List => list(ctx).await,
        CachesCommand::Delete { name, yes } => delete(ctx, &name, yes).await,
    }
}

async fn list(ctx: &Context) -> Result<()> {
    let storage = ctx.storage().await?;
    let names = storage.keys().await?;

    if ctx.output.is_json() {
        ctx.output.json(&names);
        return Ok(());
    }

    if names.is_empty() {
        ctx.output.info("No caches");
        return Ok(());
    }

    ctx.output.header("Caches");
    for name in &names {
        ctx.output.list_item(name);
    }
    Ok(())
}

async fn delete(ctx: &Context, name: &str, yes: bool) -> Result<()> {
    let storage = ctx.storage().await?;
    if !storage.has(name).await? {
        bail!("No cache named {}", name);
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete cache {}?", name))
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Delete cancelled");
            return Ok(());
        }
    }

    storage.delete(name).await?;
    ctx.records().forget(name)?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "deleted": name }));
    } else {
        ctx.output.success(&format!("Deleted cache {}", name));
    }
    Ok(())
}
