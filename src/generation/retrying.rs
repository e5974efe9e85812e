//! Sequential fallback strategy
//!
//! One producer at a time, bounded attempts, per-attempt timeout, fixed
//! backoff between attempts. Every attempt stops its producer before the
//! next one starts, so no two producers are ever live at once under this
//! strategy.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use crate::cache::token::Credentials;
use crate::producer::ProducerFactory;

use super::error::GenerateError;

pub struct RetryingSingleAttempt {
    factory: Arc<dyn ProducerFactory>,
    max_attempts: u32,
    attempt_timeout: Duration,
    backoff: Duration,
}

impl RetryingSingleAttempt {
    pub fn new(
        factory: Arc<dyn ProducerFactory>,
        max_attempts: u32,
        attempt_timeout: Duration,
        backoff: Duration,
    ) -> Self {
        Self {
            factory,
            max_attempts: max_attempts.max(1),
            attempt_timeout,
            backoff,
        }
    }

    pub async fn run(&self, session_id: &str) -> Result<Credentials, GenerateError> {
        let mut last_reason = String::new();

        for attempt in 1..=self.max_attempts {
            let mut producer = self.factory.create(session_id);

            let reason = match timeout(self.attempt_timeout, producer.start()).await {
                Ok(Ok(proof)) => {
                    let credentials = Credentials::new(session_id, proof);
                    if credentials.is_valid() {
                        producer.stop().await;
                        info!(attempt, "proof generated");
                        return Ok(credentials);
                    }
                    format!("proof too short: {} chars", credentials.proof.len())
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("attempt timed out after {:?}", self.attempt_timeout),
            };

            // The producer must be released whether it failed, timed out or
            // returned an invalid proof.
            producer.stop().await;

            warn!(attempt, max_attempts = self.max_attempts, %reason, "attempt failed");
            last_reason = reason;

            if attempt < self.max_attempts {
                sleep(self.backoff).await;
            }
        }

        error!(attempts = self.max_attempts, "all sequential attempts exhausted");
        Err(GenerateError::AttemptsExhausted {
            attempts: self.max_attempts,
            last_reason,
        })
    }
}
