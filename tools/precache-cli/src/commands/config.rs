//! Config command - show, create and validate configuration.

use anyhow::{bail, Context as _, Result};
use precache_core::WorkerConfig;

use super::{ConfigArgs, ConfigCommand};
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Init { force } => init(ctx, force),
        ConfigCommand::Validate => validate(ctx),
    }
}

fn show(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    match &ctx.config_path {
        Some(path) => ctx.output.debug(&format!("Loaded from {}", path.display())),
        None => ctx.output.debug("No config file found, using defaults"),
    }
    let rendered = toml::to_string_pretty(&ctx.config).context("Failed to render config")?;
    println!("{}", rendered);
    Ok(())
}

fn init(ctx: &Context, force: bool) -> Result<()> {
    let path = ctx.cwd.join(CONFIG_NAMES[0]);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    WorkerConfig::default()
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    ctx.output.success(&format!("Created {}", path.display()));
    Ok(())
}

fn validate(ctx: &Context) -> Result<()> {
    ctx.config.validate().context("Invalid configuration")?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "valid": true,
            "profiles": ctx.config.profiles.len(),
        }));
        return Ok(());
    }

    ctx.output.success("Configuration is valid");
    for profile in &ctx.config.profiles {
        ctx.output
            .list_item(&format!("{} ({} assets)", profile.cache_name, profile.assets.len()));
    }
    Ok(())
}
