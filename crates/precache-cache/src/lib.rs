//! Named cache stores for the offline asset cache.
//!
//! This crate provides:
//! - `CacheStorage` - The set of named caches, with a unified match
//! - `Cache` - A handle to one named cache
//! - `RequestKey` / `MatchOptions` - Request matching rules
//! - `CacheBackend` - Storage trait, with `MemoryBackend` and `DiskBackend`
//!
//! # Example
//!
//! ```ignore
//! use precache_cache::{CacheStorage, MatchOptions, MemoryBackend};
//!
//! let storage = CacheStorage::new(MemoryBackend::new());
//! let cache = storage.open("sushi-pwa-v1").await?;
//! cache.put(&request, response).await?;
//!
//! let hit = storage.match_request(&request, MatchOptions::default()).await?;
//! ```

mod backend;
mod cache;
mod disk;
mod error;
mod key;
mod storage;

pub use backend::*;
pub use cache::*;
pub use disk::*;
pub use error::*;
pub use key::*;
pub use storage::*;
