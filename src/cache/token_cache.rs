//! Credential cache with single-flight refresh
//!
//! Holds the latest successful credentials and at most one in-flight refresh
//! future per process. Concurrent callers that need a refresh attach to the
//! same future; the refresh itself runs as a spawned task so it settles even
//! if every awaiter gives up. The cached entry is replaced wholesale on
//! success and left untouched on failure.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::generation::{GenerateError, GenerationCoordinator};

use super::token::Credentials;

type RefreshFuture = Shared<BoxFuture<'static, Result<Credentials, GenerateError>>>;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub credentials: Credentials,
    pub last_updated: DateTime<Utc>,
}

#[derive(Default)]
struct CacheState {
    entry: Option<CacheEntry>,
    in_flight: Option<RefreshFuture>,
    refresh_count: u64,
}

/// Read-only snapshot served by the status page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub last_updated: Option<DateTime<Utc>>,
    pub refreshing: bool,
    pub refresh_count: u64,
}

pub struct TokenCache {
    state: Arc<Mutex<CacheState>>,
    coordinator: Arc<GenerationCoordinator>,
    refresh_interval: Duration,
}

impl TokenCache {
    pub fn new(coordinator: Arc<GenerationCoordinator>, refresh_interval: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            coordinator,
            refresh_interval,
        }
    }

    /// Return valid credentials, refreshing first when forced, absent or stale.
    ///
    /// All callers that need the same refresh share one future; its outcome,
    /// success or failure, is delivered to every one of them.
    pub async fn get(&self, force_update: bool) -> Result<Credentials, GenerateError> {
        let refresh = {
            let mut state = self.state.lock().await;

            if !force_update {
                if let Some(entry) = &state.entry {
                    if is_fresh(entry.last_updated, self.refresh_interval) {
                        return Ok(entry.credentials.clone());
                    }
                }
            }

            match &state.in_flight {
                Some(existing) => {
                    info!("refresh already in flight, attaching");
                    existing.clone()
                }
                None => {
                    let refresh = self.start_refresh();
                    state.in_flight = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await
    }

    /// Spawn one generation cycle and wrap it in a sharable future. The task
    /// commits the result and clears the in-flight slot itself, so the slot is
    /// released no matter what happens to the callers.
    fn start_refresh(&self) -> RefreshFuture {
        info!("starting credential refresh");
        let coordinator = self.coordinator.clone();
        let state = self.state.clone();

        let task = tokio::spawn(async move {
            let result = coordinator.generate().await;

            let mut state = state.lock().await;
            match &result {
                Ok(credentials) => {
                    state.entry = Some(CacheEntry {
                        credentials: credentials.clone(),
                        last_updated: Utc::now(),
                    });
                    state.refresh_count += 1;
                    info!("credential cache updated");
                }
                Err(e) => {
                    warn!(error = %e, "refresh failed, keeping last known credentials");
                }
            }
            state.in_flight = None;
            result
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(GenerateError::Internal(format!("refresh task failed: {e}"))),
            }
        }
        .boxed()
        .shared()
    }

    pub async fn status(&self) -> CacheStatus {
        let state = self.state.lock().await;
        CacheStatus {
            last_updated: state.entry.as_ref().map(|e| e.last_updated),
            refreshing: state.in_flight.is_some(),
            refresh_count: state.refresh_count,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Place an entry with a chosen timestamp, bypassing generation.
    #[cfg(test)]
    pub(crate) async fn seed(&self, credentials: Credentials, last_updated: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        state.entry = Some(CacheEntry {
            credentials,
            last_updated,
        });
    }
}

fn is_fresh(last_updated: DateTime<Utc>, refresh_interval: Duration) -> bool {
    // A timestamp in the future (clock adjustment) counts as fresh.
    Utc::now()
        .signed_duration_since(last_updated)
        .to_std()
        .map(|age| age <= refresh_interval)
        .unwrap_or(true)
}
