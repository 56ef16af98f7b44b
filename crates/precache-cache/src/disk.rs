//! Persistent backend storing each cache as a JSON file.
//!
//! Layout under the root directory:
//! - `index.json` - cache names in creation order
//! - `<name>.cache.json` - one `CacheTable` per cache, file name base64url-encoded
//!
//! Every write goes to a temporary file that is then renamed over the
//! target, so a batch is either fully visible or not at all.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::backend::{CacheBackend, CacheEntry, CacheTable};
use crate::error::{CacheError, CacheResult};
use crate::key::RequestKey;

const INDEX_FILE: &str = "index.json";

/// File-backed cache storage that survives restarts.
#[derive(Debug)]
pub struct DiskBackend {
    root: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl DiskBackend {
    /// Open (creating if needed) a storage directory.
    pub async fn new(root: impl Into<PathBuf>) -> CacheResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| io_error(&root, e))?;
        tracing::debug!(root = %root.display(), "opened disk cache storage");
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    /// Storage directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("{}.cache.json", URL_SAFE_NO_PAD.encode(name)))
    }

    async fn read_index(&self) -> CacheResult<Vec<String>> {
        Ok(read_json(&self.index_path()).await?.unwrap_or_default())
    }

    async fn read_table(&self, name: &str) -> CacheResult<CacheTable> {
        let index = self.read_index().await?;
        if !index.iter().any(|n| n == name) {
            return Err(CacheError::NoSuchCache(name.to_string()));
        }
        Ok(read_json(&self.table_path(name))
            .await?
            .unwrap_or_else(|| CacheTable::new(name)))
    }
}

#[async_trait]
impl CacheBackend for DiskBackend {
    async fn cache_names(&self) -> CacheResult<Vec<String>> {
        let _guard = self.lock.lock().await;
        self.read_index().await
    }

    async fn open(&self, name: &str) -> CacheResult<bool> {
        let _guard = self.lock.lock().await;
        let mut index = self.read_index().await?;
        if index.iter().any(|n| n == name) {
            return Ok(false);
        }

        write_json(&self.table_path(name), &CacheTable::new(name)).await?;
        index.push(name.to_string());
        write_json(&self.index_path(), &index).await?;
        Ok(true)
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        let _guard = self.lock.lock().await;
        Ok(self.read_index().await?.iter().any(|n| n == name))
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let _guard = self.lock.lock().await;
        let mut index = self.read_index().await?;
        let before = index.len();
        index.retain(|n| n != name);
        if index.len() == before {
            return Ok(false);
        }

        // Index first: a listed cache must always have its file.
        write_json(&self.index_path(), &index).await?;
        let path = self.table_path(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(&path, e)),
        }
        Ok(true)
    }

    async fn get(&self, name: &str, key: &RequestKey) -> CacheResult<Option<CacheEntry>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_table(name).await?.get(key).cloned())
    }

    async fn entries(&self, name: &str) -> CacheResult<Vec<CacheEntry>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_table(name).await?.entries)
    }

    async fn put_batch(&self, name: &str, entries: Vec<CacheEntry>) -> CacheResult<()> {
        let _guard = self.lock.lock().await;
        let mut table = self.read_table(name).await?;
        for entry in entries {
            table.upsert(entry);
        }
        write_json(&self.table_path(name), &table).await
    }

    async fn remove(&self, name: &str, key: &RequestKey) -> CacheResult<bool> {
        let _guard = self.lock.lock().await;
        let mut table = self.read_table(name).await?;
        if !table.remove(key) {
            return Ok(false);
        }
        write_json(&self.table_path(name), &table).await?;
        Ok(true)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.display().to_string(),
        source,
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> CacheResult<Option<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| CacheError::Corrupt {
            path: path.display().to_string(),
            source,
        })
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> CacheResult<()> {
    let bytes = serde_json::to_vec(value)?;
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|e| io_error(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| io_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use precache_core::Response;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::from_url(&Url::parse("http://localhost:5000").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let backend = DiskBackend::new(dir.path()).await.unwrap();
            assert!(backend.open("sushi-pwa-v1").await.unwrap());
            backend
                .put_batch(
                    "sushi-pwa-v1",
                    vec![CacheEntry::new(
                        key("/client_pwa/icon-192.png"),
                        Response::ok(vec![0x89, b'P', b'N', b'G']).with_header("Content-Type", "image/png"),
                    )],
                )
                .await
                .unwrap();
        }

        let backend = DiskBackend::new(dir.path()).await.unwrap();
        assert!(!backend.open("sushi-pwa-v1").await.unwrap());

        let entry = backend
            .get("sushi-pwa-v1", &key("/client_pwa/icon-192.png"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.response.bytes(), &[0x89, b'P', b'N', b'G']);
        assert_eq!(entry.response.content_type(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_names_with_path_characters() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DiskBackend::new(dir.path()).await.unwrap();

        backend.open("../escape/v1").await.unwrap();
        backend.open("v2").await.unwrap();

        assert_eq!(
            backend.cache_names().await.unwrap(),
            vec!["../escape/v1", "v2"]
        );
        assert!(!dir.path().parent().unwrap().join("escape").exists());
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DiskBackend::new(dir.path()).await.unwrap();

        backend.open("v1").await.unwrap();
        let path = backend.table_path("v1");
        assert!(path.exists());

        assert!(backend.delete("v1").await.unwrap());
        assert!(!path.exists());
        assert!(!backend.has("v1").await.unwrap());
        assert!(!backend.delete("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_table_reported() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DiskBackend::new(dir.path()).await.unwrap();
        backend.open("v1").await.unwrap();

        std::fs::write(backend.table_path("v1"), b"{not json").unwrap();

        assert!(matches!(
            backend.entries("v1").await,
            Err(CacheError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_cache() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DiskBackend::new(dir.path()).await.unwrap();
        assert!(matches!(
            backend.put_batch("v1", Vec::new()).await,
            Err(CacheError::NoSuchCache(_))
        ));
    }
}
