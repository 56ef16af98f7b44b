//! Network access for the offline asset cache.
//!
//! This crate provides:
//! - `Network` trait - Fetch a `Request` into a `Response`
//! - `HttpNetwork` - Live HTTP client
//! - `StubNetwork` - Canned responses with call recording

mod client;
mod error;
mod stub;

pub use client::*;
pub use error::*;
pub use stub::*;
