//! Background refresh loop
//!
//! Keeps the cache warm by asking for credentials forever. Failures are
//! logged and retried after a shorter recovery delay; the loop never exits
//! because generation failed. It shares the cache's single-flight refresh
//! with direct callers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::cache::TokenCache;

pub struct AutoRefreshLoop {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl AutoRefreshLoop {
    /// Spawn the loop. It runs until [`stop`](Self::stop) is called.
    pub fn start(cache: Arc<TokenCache>, recovery_delay: Duration) -> Self {
        let (shutdown, mut rx) = watch::channel(false);
        let refresh_interval = cache.refresh_interval();

        let task = tokio::spawn(async move {
            info!("auto-refresh loop started");
            loop {
                let wait = match cache.get(false).await {
                    Ok(_) => {
                        debug!("background refresh ok");
                        refresh_interval
                    }
                    Err(e) => {
                        warn!(error = %e, "background refresh failed, retrying shortly");
                        recovery_delay
                    }
                };

                tokio::select! {
                    _ = sleep(wait) => {}
                    _ = rx.changed() => break,
                }
            }
            info!("auto-refresh loop stopped");
        });

        Self { shutdown, task }
    }

    /// Halt the loop at the next iteration boundary.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
