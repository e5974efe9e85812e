//! Generation cycle orchestration
//!
//! One cycle: fetch the session identifier, then delegate proof derivation to
//! the worker race or the sequential retry loop, under an overall deadline.
//! A process-wide busy flag rejects direct concurrent use; callers are
//! expected to queue through the cache's single-flight future instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::cache::token::Credentials;
use crate::config::settings::GenerationSettings;
use crate::producer::ProducerFactory;
use crate::session::SessionFetcher;

use super::error::GenerateError;
use super::{pool, retrying::RetryingSingleAttempt};

pub struct GenerationCoordinator {
    fetcher: Arc<dyn SessionFetcher>,
    factory: Arc<dyn ProducerFactory>,
    settings: GenerationSettings,
    busy: AtomicBool,
}

impl GenerationCoordinator {
    pub fn new(
        fetcher: Arc<dyn SessionFetcher>,
        factory: Arc<dyn ProducerFactory>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            fetcher,
            factory,
            settings,
            busy: AtomicBool::new(false),
        }
    }

    /// Run one full generation cycle. At most one may be in progress at a
    /// time; a concurrent direct call fails immediately instead of queuing.
    pub async fn generate(&self) -> Result<Credentials, GenerateError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("generation requested while another cycle is in progress");
            return Err(GenerateError::AlreadyInProgress);
        }
        // Released when the cycle ends, success or failure.
        let _guard = BusyGuard { busy: &self.busy };

        self.generate_inner().await
    }

    async fn generate_inner(&self) -> Result<Credentials, GenerateError> {
        let session_id = self
            .fetcher
            .fetch_session_id()
            .await
            .map_err(|e| GenerateError::Prerequisite(e.to_string()))?;
        debug!("session identifier acquired, deriving proof");

        let deadline = self.settings.overall_deadline;
        let credentials = if self.settings.parallel {
            pool::race(
                self.factory.clone(),
                &session_id,
                self.settings.worker_count,
                deadline,
            )
            .await?
        } else {
            let strategy = RetryingSingleAttempt::new(
                self.factory.clone(),
                self.settings.max_attempts,
                self.settings.attempt_timeout,
                self.settings.backoff,
            );
            // Last-resort bound; the strategies time their own attempts.
            timeout(deadline, strategy.run(&session_id))
                .await
                .map_err(|_| GenerateError::DeadlineElapsed(deadline))??
        };

        info!(proof_len = credentials.proof.len(), "generation cycle succeeded");
        Ok(credentials)
    }
}

struct BusyGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}
