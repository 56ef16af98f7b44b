//! Precache CLI - Pre-cache static assets and serve them cache-first.
//!
//! Commands:
//! - `precache install` - Pre-cache a profile's assets and activate it
//! - `precache fetch` - Fetch URLs cache-first
//! - `precache status` - Show caches and worker state
//! - `precache caches` - List or delete caches
//! - `precache config` - Manage configuration

mod commands;
mod context;
mod output;
mod state;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CachesArgs, ConfigArgs, FetchArgs, InstallArgs, StatusArgs};

/// Precache - Offline asset cache with cache-first serving
#[derive(Parser)]
#[command(name = "precache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pre-cache a profile's assets and activate it
    Install(InstallArgs),

    /// Fetch URLs, answering from cache first
    Fetch(FetchArgs),

    /// Show caches and worker state
    Status(StatusArgs),

    /// List or delete caches
    Caches(CachesArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Install the global `tracing` subscriber. Fails if one is already set.
fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "precache_core={level},precache_cache={level},precache_network={level},precache_worker={level},precache={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    if !cli.json {
        if let Err(e) = init_tracing(cli.verbose) {
            output.warn(&format!("{:#}", e));
        }
    }

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Execute command
    let result = match cli.command {
        Commands::Install(args) => commands::install::run(args, &ctx).await,
        Commands::Fetch(args) => commands::fetch::run(args, &ctx).await,
        Commands::Status(args) => commands::status::run(args, &ctx).await,
        Commands::Caches(args) => commands::caches::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
