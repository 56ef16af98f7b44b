//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use precache_cache::{CacheStorage, DiskBackend};
use precache_core::WorkerConfig;
use precache_network::HttpNetwork;

use crate::output::Output;
use crate::state::WorkerRecords;

/// File names searched for when no `--config` is given.
pub const CONFIG_NAMES: [&str; 3] = ["precache.toml", ".precache.toml", "precache.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Loaded configuration.
    pub config: WorkerConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            let path = resolve_path(&cwd, Path::new(path));
            let config = WorkerConfig::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            (config, Some(path))
        } else {
            // Try to find config in current directory or parent directories
            match find_config(&cwd) {
                Some(path) => {
                    let config = WorkerConfig::load(&path)
                        .with_context(|| format!("Failed to load config from {}", path.display()))?;
                    (config, Some(path))
                }
                None => (WorkerConfig::default(), None),
            }
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Directory holding the disk caches.
    pub fn storage_dir(&self) -> PathBuf {
        resolve_path(&self.cwd, &self.config.storage.dir)
    }

    /// Open cache storage on disk.
    pub async fn storage(&self) -> Result<CacheStorage<DiskBackend>> {
        let dir = self.storage_dir();
        let backend = DiskBackend::new(&dir)
            .await
            .with_context(|| format!("Failed to open cache storage at {}", dir.display()))?;
        Ok(CacheStorage::new(backend))
    }

    /// Build the HTTP client.
    pub fn network(&self) -> Result<HttpNetwork> {
        HttpNetwork::new(&self.config.network).context("Failed to build HTTP client")
    }

    /// Recorded worker states.
    pub fn records(&self) -> WorkerRecords {
        WorkerRecords::new(self.storage_dir())
    }
}

/// Find a config file in the directory tree, starting at `start`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in &CONFIG_NAMES {
            let config_path = current.join(name);
            if config_path.is_file() {
                return Some(config_path);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

fn resolve_path(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
