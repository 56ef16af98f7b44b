//! Core error types.

use thiserror::Error;

use crate::lifecycle::{LifecycleSignal, WorkerState};

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read or write the config file.
    #[error("config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Failed to serialize TOML.
    #[error("failed to serialize TOML config: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Failed to parse or serialize JSON.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// A profile has an empty cache name.
    #[error("cache name must not be empty")]
    EmptyCacheName,

    /// Two profiles share a cache name.
    #[error("duplicate cache profile: {0}")]
    DuplicateProfile(String),

    /// An asset could not be turned into an absolute URL.
    #[error("invalid asset URL {url:?}: {reason}")]
    InvalidAsset { url: String, reason: String },

    /// Two assets resolve to the same request.
    #[error("duplicate asset in cache list: {0}")]
    DuplicateAsset(String),

    /// No profile with the given name.
    #[error("no cache profile named {0:?}")]
    UnknownProfile(String),
}

/// Errors raised by the lifecycle state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The signal is not valid in the current state.
    #[error("cannot apply {signal} while {from}")]
    InvalidTransition {
        from: WorkerState,
        signal: LifecycleSignal,
    },
}
