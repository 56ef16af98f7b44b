//! Core abstractions for the offline asset cache.
//!
//! This crate provides the fundamental types:
//! - `WorkerConfig` / `CacheProfile` - Cache name, origin and asset list
//! - `Request` / `Response` - Transport-neutral HTTP messages
//! - `WorkerState` - Install/activate lifecycle state machine
//! - `LifecycleObserver` trait - Transition notifications

mod config;
mod error;
mod lifecycle;
mod message;

pub use config::*;
pub use error::*;
pub use lifecycle::*;
pub use message::*;
