//! Cache profile and worker configuration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Cache name used when no profile is configured.
pub const DEFAULT_CACHE_NAME: &str = "sushi-pwa-v1";

/// Origin that same-origin asset paths are resolved against by default.
pub const DEFAULT_ORIGIN: &str = "http://localhost:5000";

/// Assets pre-cached by the default profile.
pub const DEFAULT_ASSETS: &[&str] = &[
    "/",
    "/client_pwa/index.html",
    "/client_pwa/manifest.json",
    "/client_pwa/icon-192.png",
    "/client_pwa/icon-512.png",
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css",
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/js/bootstrap.bundle.min.js",
];

/// A named cache and the assets installed into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheProfile {
    /// Name of the cache store. Acts as the version key.
    pub cache_name: String,

    /// Origin for same-origin paths such as `/client_pwa/index.html`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    /// Ordered list of asset URLs.
    #[serde(default)]
    pub assets: Vec<String>,
}

impl CacheProfile {
    /// Create an empty profile.
    pub fn new(cache_name: impl Into<String>) -> Self {
        Self {
            cache_name: cache_name.into(),
            origin: None,
            assets: Vec::new(),
        }
    }

    /// Set the origin for relative assets.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Append one asset.
    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.assets.push(asset.into());
        self
    }

    /// Append several assets.
    pub fn with_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assets.extend(assets.into_iter().map(Into::into));
        self
    }

    /// Parse the configured origin, if any.
    pub fn origin_url(&self) -> Result<Option<Url>, ConfigError> {
        self.origin
            .as_deref()
            .map(|origin| {
                Url::parse(origin).map_err(|e| ConfigError::InvalidAsset {
                    url: origin.to_string(),
                    reason: format!("bad origin: {}", e),
                })
            })
            .transpose()
    }

    /// Resolve a single URL against this profile's origin.
    pub fn resolve(&self, raw: &str) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidAsset {
            url: raw.to_string(),
            reason,
        };

        match Url::parse(raw) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(url),
                other => Err(invalid(format!("unsupported scheme {:?}", other))),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let origin = self
                    .origin_url()?
                    .ok_or_else(|| invalid("relative path without an origin".to_string()))?;
                origin.join(raw).map_err(|e| invalid(e.to_string()))
            }
            Err(e) => Err(invalid(e.to_string())),
        }
    }

    /// Resolve every asset to an absolute URL, in list order.
    ///
    /// Fails on the first unresolvable asset, or when two assets name the
    /// same request (fragments are ignored).
    pub fn resolve_assets(&self) -> Result<Vec<Url>, ConfigError> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(self.assets.len());

        for asset in &self.assets {
            let url = self.resolve(asset)?;
            let mut key = url.clone();
            key.set_fragment(None);
            if !seen.insert(key.to_string()) {
                return Err(ConfigError::DuplicateAsset(key.to_string()));
            }
            resolved.push(url);
        }

        Ok(resolved)
    }

    /// Check the profile without touching the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::EmptyCacheName);
        }
        self.resolve_assets().map(|_| ())
    }
}

impl Default for CacheProfile {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_NAME)
            .with_origin(DEFAULT_ORIGIN)
            .with_assets(DEFAULT_ASSETS.iter().copied())
    }
}

/// Where cache stores are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the on-disk caches.
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".precache")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout. Unset means the client default (none).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_user_agent() -> String {
    format!("precache/{}", env!("CARGO_PKG_VERSION"))
}

impl NetworkConfig {
    /// Get the timeout as a duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Network settings.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Cache profiles. The first one is the default.
    #[serde(default = "default_profiles", rename = "profile")]
    pub profiles: Vec<CacheProfile>,
}

fn default_profiles() -> Vec<CacheProfile> {
    vec![CacheProfile::default()]
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            network: NetworkConfig::default(),
            profiles: default_profiles(),
        }
    }
}

impl WorkerConfig {
    /// Load config from a file. `.json` files are read as JSON, anything
    /// else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        if is_json(path) {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    /// Save config to a file, in the format implied by its extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Validate every profile and reject duplicate cache names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for profile in &self.profiles {
            profile.validate()?;
            if !names.insert(profile.cache_name.as_str()) {
                return Err(ConfigError::DuplicateProfile(profile.cache_name.clone()));
            }
        }
        Ok(())
    }

    /// Select a profile by cache name, or the first one when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<&CacheProfile, ConfigError> {
        match name {
            Some(name) => self
                .profiles
                .iter()
                .find(|p| p.cache_name == name)
                .ok_or_else(|| ConfigError::UnknownProfile(name.to_string())),
            None => self
                .profiles
                .first()
                .ok_or_else(|| ConfigError::UnknownProfile("<default>".to_string())),
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().map(|ext| ext == "json").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_matches_asset_list() {
        let profile = CacheProfile::default();
        assert_eq!(profile.cache_name, "sushi-pwa-v1");
        assert_eq!(profile.assets.len(), 7);
        assert_eq!(profile.assets[0], "/");
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let profile = CacheProfile::new("v1").with_origin("http://localhost:5000");

        let rel = profile.resolve("/client_pwa/index.html").unwrap();
        assert_eq!(rel.as_str(), "http://localhost:5000/client_pwa/index.html");

        let abs = profile.resolve("https://cdn.example.com/app.css").unwrap();
        assert_eq!(abs.as_str(), "https://cdn.example.com/app.css");
    }

    #[test]
    fn test_relative_without_origin_fails() {
        let profile = CacheProfile::new("v1").with_asset("/index.html");
        assert!(matches!(
            profile.resolve_assets(),
            Err(ConfigError::InvalidAsset { .. })
        ));
    }

    #[test]
    fn test_unsupported_scheme_rejected() {
        let profile = CacheProfile::new("v1").with_asset("ftp://example.com/file");
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_duplicate_assets_rejected() {
        let profile = CacheProfile::new("v1")
            .with_origin("http://localhost:5000")
            .with_assets(["/index.html", "http://localhost:5000/index.html#top"]);

        assert!(matches!(
            profile.resolve_assets(),
            Err(ConfigError::DuplicateAsset(_))
        ));
    }

    #[test]
    fn test_empty_cache_name_rejected() {
        let profile = CacheProfile::new("  ");
        assert!(matches!(profile.validate(), Err(ConfigError::EmptyCacheName)));
    }

    #[test]
    fn test_duplicate_profiles_rejected() {
        let config = WorkerConfig {
            profiles: vec![CacheProfile::new("v1"), CacheProfile::new("v1")],
            ..WorkerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateProfile(_))
        ));
    }

    #[test]
    fn test_profile_selection() {
        let config = WorkerConfig {
            profiles: vec![CacheProfile::new("v1"), CacheProfile::new("v2")],
            ..WorkerConfig::default()
        };

        assert_eq!(config.profile(None).unwrap().cache_name, "v1");
        assert_eq!(config.profile(Some("v2")).unwrap().cache_name, "v2");
        assert!(config.profile(Some("v3")).is_err());
    }

    #[test]
    fn test_parse_toml() {
        let config: WorkerConfig = toml::from_str(
            r#"
            [storage]
            dir = "/var/cache/precache"

            [network]
            timeout_secs = 10

            [[profile]]
            cache_name = "shop-v2"
            origin = "https://shop.example.com"
            assets = ["/", "/app.js"]
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.dir, PathBuf::from("/var/cache/precache"));
        assert_eq!(config.network.timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.profiles.len(), 1);
        assert_eq!(config.profiles[0].assets, vec!["/", "/app.js"]);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: WorkerConfig = toml::from_str("").unwrap();
        assert_eq!(config, WorkerConfig::default());
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("precache.json");

        let config = WorkerConfig::default();
        config.save(&path).unwrap();

        let loaded = WorkerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = WorkerConfig::load("/nonexistent/precache.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
