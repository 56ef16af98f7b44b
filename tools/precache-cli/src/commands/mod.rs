//! CLI command implementations.

pub mod caches;
pub mod config;
pub mod fetch;
pub mod install;
pub mod status;

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Cache profile to install (default: first profile).
    #[arg(short, long)]
    pub profile: Option<String>,
}

/// Arguments for the fetch command.
#[derive(Args)]
pub struct FetchArgs {
    /// URLs to fetch. Paths are resolved against the profile origin.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Cache profile whose worker answers (default: first profile).
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Write the response body to a file (single URL only).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Ignore the query string when matching cached entries.
    #[arg(long)]
    pub ignore_search: bool,
}

/// Arguments for the status command.
#[derive(Args)]
pub struct StatusArgs {
    /// List every cached URL.
    #[arg(short, long)]
    pub entries: bool,
}

/// Arguments for the caches command.
#[derive(Args)]
pub struct CachesArgs {
    #[command(subcommand)]
    pub command: CachesCommand,
}

#[derive(Subcommand)]
pub enum CachesCommand {
    /// List caches.
    List,

    /// Delete a cache.
    Delete {
        /// Cache name.
        name: String,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,

    /// Write a default precache.toml.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the configuration.
    Validate,
}
