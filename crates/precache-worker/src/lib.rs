//! Install-time asset cache and cache-first fetch interceptor.
//!
//! `ServiceWorker` drives a `CacheProfile` through the lifecycle:
//! install pre-caches every asset (all or nothing), activation hands
//! control to the `FetchInterceptor`, which answers from cache and
//! falls back to the network on a miss.
//!
//! # Example
//!
//! ```ignore
//! use precache_cache::{CacheStorage, MemoryBackend};
//! use precache_core::{CacheProfile, Request};
//! use precache_network::HttpNetwork;
//! use precache_worker::ServiceWorker;
//!
//! let worker = ServiceWorker::new(
//!     CacheProfile::default(),
//!     CacheStorage::new(MemoryBackend::new()),
//!     HttpNetwork::new(&Default::default())?,
//! );
//! worker.start().await?;
//!
//! let outcome = worker
//!     .handle_fetch(&Request::parse_get("http://localhost:5000/")?)
//!     .await?;
//! ```

mod error;
mod install;
mod intercept;
mod worker;

pub use error::*;
pub use install::*;
pub use intercept::*;
pub use worker::*;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CacheStatus, FetchInterceptor, FetchOutcome, InstallReport, ServiceWorker, WorkerError,
    };
    pub use precache_cache::{CacheStorage, DiskBackend, MatchOptions, MemoryBackend};
    pub use precache_core::{CacheProfile, Request, Response, WorkerConfig, WorkerState};
    pub use precache_network::{HttpNetwork, Network, StubNetwork};
}
