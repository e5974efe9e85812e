use std::time::Duration;

use thiserror::Error;

/// Failures surfaced by a generation cycle.
///
/// Results travel through a shared in-flight future cloned to every attached
/// caller, so the variants are cheap to clone and carry rendered reasons
/// rather than source errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerateError {
    /// Session identifier fetch failed; no producer was started.
    #[error("session identifier fetch failed: {0}")]
    Prerequisite(String),

    /// The coordinator was invoked directly while a cycle was running.
    #[error("token generation already in progress")]
    AlreadyInProgress,

    /// Every worker in the race reported failure.
    #[error("all {worker_count} workers failed, last: {last_reason}")]
    AllWorkersFailed {
        worker_count: usize,
        last_reason: String,
    },

    /// The sequential strategy ran out of attempts.
    #[error("failed to generate a proof after {attempts} attempts, last: {last_reason}")]
    AttemptsExhausted { attempts: u32, last_reason: String },

    /// The overall deadline elapsed before any strategy settled.
    #[error("token generation timed out after {0:?}")]
    DeadlineElapsed(Duration),

    #[error("token generation failed internally: {0}")]
    Internal(String),
}
