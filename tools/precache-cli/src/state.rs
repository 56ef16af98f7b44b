//! Worker state persisted between CLI invocations.
//!
//! Each `precache` run is a fresh process, so the lifecycle state reached by
//! `install` is recorded next to the caches and read back by `fetch` and
//! `status`.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use precache_core::WorkerState;
use serde::{Deserialize, Serialize};

const RECORDS_FILE: &str = "workers.json";

/// Last known state of the worker for one cache profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub cache_name: String,
    pub state: WorkerState,
    pub updated_at: DateTime<Utc>,
}

/// Worker records stored under the storage directory.
pub struct WorkerRecords {
    dir: PathBuf,
}

impl WorkerRecords {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(RECORDS_FILE)
    }

    /// Read all records. A missing file means no worker has run yet.
    pub fn load(&self) -> Result<Vec<WorkerRecord>> {
        let path = self.path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// State recorded for a cache, `Uninstalled` if none.
    pub fn state_of(&self, cache_name: &str) -> Result<WorkerState> {
        Ok(self
            .load()?
            .into_iter()
            .find(|r| r.cache_name == cache_name)
            .map(|r| r.state)
            .unwrap_or_default())
    }

    /// Record the state reached by the worker for a cache.
    pub fn record(&self, cache_name: &str, state: WorkerState) -> Result<()> {
        let mut records = self.load()?;
        let record = WorkerRecord {
            cache_name: cache_name.to_string(),
            state,
            updated_at: Utc::now(),
        };
        match records.iter().position(|r| r.cache_name == cache_name) {
            Some(index) => records[index] = record,
            None => records.push(record),
        }
        self.save(&records)
    }

    /// Record a failed install. A worker already active for the cache keeps
    /// control and its record is left as is. Returns the state now recorded.
    pub fn record_failure(&self, cache_name: &str, state: WorkerState) -> Result<WorkerState> {
        let current = self.state_of(cache_name)?;
        if current.is_controlling() {
            return Ok(current);
        }
        self.record(cache_name, state)?;
        Ok(state)
    }

    /// Drop the record for a cache.
    pub fn forget(&self, cache_name: &str) -> Result<()> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.cache_name != cache_name);
        if records.len() != before {
            self.save(&records)?;
        }
        Ok(())
    }

    fn save(&self, records: &[WorkerRecord]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.path();
        let content = serde_json::to_string_pretty(records)?;
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
    }
}
