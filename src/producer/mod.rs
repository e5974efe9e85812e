//! The producer seam
//!
//! A [`TokenProducer`] is the opaque capability that derives a proof from a
//! session identifier. The orchestration layer only relies on its contract:
//! `start` yields exactly one terminal outcome, `stop` cancels and releases
//! resources and is safe to call repeatedly or after completion.

pub mod command;

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TokenProducer: Send {
    /// Run one derivation to its terminal outcome: the proof string, or an error.
    async fn start(&mut self) -> Result<String>;

    /// Cancel the derivation and release its resources. Idempotent.
    async fn stop(&mut self);
}

/// Builds one producer per generation attempt. Each attempt gets its own
/// instance; producers are never reused across attempts.
pub trait ProducerFactory: Send + Sync {
    fn create(&self, session_id: &str) -> Box<dyn TokenProducer>;
}
