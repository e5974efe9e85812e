//! # proof-agent
//!
//! Maintains a continuously-refreshed pair of authentication credentials
//! (a session identifier plus a derived proof token) and serves the freshest
//! known pair over HTTP.
//!
//! Modules:
//! - `cache` — credential cache with single-flight refresh deduplication
//! - `generation` — coordinator, worker race and sequential retry strategies
//! - `producer` — the opaque proof-derivation capability and its subprocess impl
//! - `session` — session identifier acquisition
//! - `refresh` — background auto-refresh loop
//! - `server` — HTTP serving surface

pub mod cache;
pub mod config;
pub mod generation;
pub mod producer;
pub mod refresh;
pub mod server;
pub mod session;
pub mod utils;

#[cfg(test)]
pub mod tests;

pub use crate::cache::{Credentials, TokenCache};
pub use crate::generation::{GenerateError, GenerationCoordinator};
