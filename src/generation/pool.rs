//! First-success-wins worker race
//!
//! Spawns N isolated worker tasks, each owning one producer. Results flow up
//! a single mpsc channel; the stop signal flows down a watch channel. The
//! dispatcher settles on the first success, counts failures toward
//! all-workers-failed, and runs its own deadline timer so it can broadcast
//! stop before failing with a timeout.
//!
//! Invariant: every spawned worker receives a stop signal exactly once,
//! winner included, and none survives past race settlement. A worker whose
//! stop channel closes (dispatcher dropped) treats that as stop, so even a
//! cancelled race cannot leak workers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::cache::token::Credentials;
use crate::producer::{ProducerFactory, TokenProducer};

use super::error::GenerateError;

enum WorkerReport {
    Success { id: usize, credentials: Credentials },
    Failure { id: usize, reason: String },
}

/// Race `worker_count` producers against each other for one session id.
/// Fails only if every worker fails or the deadline elapses first.
pub async fn race(
    factory: Arc<dyn ProducerFactory>,
    session_id: &str,
    worker_count: usize,
    deadline: Duration,
) -> Result<Credentials, GenerateError> {
    let worker_count = worker_count.max(1);
    let (report_tx, mut report_rx) = mpsc::channel::<WorkerReport>(worker_count);
    let (stop_tx, _) = watch::channel(false);

    info!(worker_count, "starting worker race");
    for id in 0..worker_count {
        let producer = factory.create(session_id);
        let worker = Worker {
            id,
            session_id: session_id.to_string(),
            report: report_tx.clone(),
            stop: stop_tx.subscribe(),
        };
        tokio::spawn(worker.run(producer));
    }
    // The dispatcher holds no sender; a closed channel means every worker is gone.
    drop(report_tx);

    let timer = sleep(deadline);
    tokio::pin!(timer);

    let mut failures = 0usize;
    let mut last_reason = String::from("no worker reported");
    loop {
        tokio::select! {
            report = report_rx.recv() => match report {
                Some(WorkerReport::Success { id, credentials }) => {
                    info!(worker = id, "worker won the race");
                    let _ = stop_tx.send(true);
                    return Ok(credentials);
                }
                Some(WorkerReport::Failure { id, reason }) => {
                    warn!(worker = id, %reason, "worker failed");
                    failures += 1;
                    last_reason = reason;
                    if failures == worker_count {
                        let _ = stop_tx.send(true);
                        return Err(GenerateError::AllWorkersFailed { worker_count, last_reason });
                    }
                }
                // Every worker exited without a success report.
                None => {
                    let _ = stop_tx.send(true);
                    return Err(GenerateError::AllWorkersFailed { worker_count, last_reason });
                }
            },
            _ = &mut timer => {
                warn!(?deadline, "race deadline elapsed, stopping all workers");
                let _ = stop_tx.send(true);
                return Err(GenerateError::DeadlineElapsed(deadline));
            }
        }
    }
}

struct Worker {
    id: usize,
    session_id: String,
    report: mpsc::Sender<WorkerReport>,
    stop: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self, mut producer: Box<dyn TokenProducer>) {
        let outcome = tokio::select! {
            result = producer.start() => Some(result),
            // Err means the dispatcher is gone; treat as stop either way.
            _ = self.stop.changed() => None,
        };

        let reported = outcome.is_some();
        match outcome {
            Some(Ok(proof)) => {
                let credentials = Credentials::new(self.session_id.clone(), proof);
                let report = if credentials.is_valid() {
                    WorkerReport::Success { id: self.id, credentials }
                } else {
                    WorkerReport::Failure {
                        id: self.id,
                        reason: format!("proof too short: {} chars", credentials.proof.len()),
                    }
                };
                let _ = self.report.send(report).await;
            }
            Some(Err(e)) => {
                let _ = self
                    .report
                    .send(WorkerReport::Failure {
                        id: self.id,
                        reason: e.to_string(),
                    })
                    .await;
            }
            // Stop arrived before a terminal outcome; nothing to report.
            None => {}
        }

        if reported {
            // Hold the producer until the pool-wide stop, so settlement tears
            // every worker down at the same point.
            let _ = self.stop.changed().await;
        }
        producer.stop().await;
        debug!(worker = self.id, "worker stopped");
    }
}
