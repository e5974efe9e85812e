use std::time::Duration;

use crate::utils::constants::{
    DEFAULT_ATTEMPT_TIMEOUT_MS, DEFAULT_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_OVERALL_DEADLINE_MS, DEFAULT_RECOVERY_DELAY_MS, DEFAULT_REFRESH_INTERVAL_MS,
};

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub generation: GenerationSettings,
    /// Cached credentials older than this trigger a refresh.
    pub refresh_interval: Duration,
    /// Wait after a failed background refresh before trying again.
    pub recovery_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// Run the worker race; when false, fall back to the sequential retry loop.
    pub parallel: bool,
    /// Workers spawned per race. Defaults to available cores minus one, minimum 1.
    pub worker_count: usize,
    /// Upper bound on one whole generation cycle.
    pub overall_deadline: Duration,
    pub max_attempts: u32,
    /// Per-attempt bound under the sequential strategy.
    pub attempt_timeout: Duration,
    /// Pause between sequential attempts.
    pub backoff: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            parallel: true,
            worker_count: default_worker_count(),
            overall_deadline: Duration::from_millis(DEFAULT_OVERALL_DEADLINE_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            attempt_timeout: Duration::from_millis(DEFAULT_ATTEMPT_TIMEOUT_MS),
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 4416,
            },
            generation: GenerationSettings::default(),
            refresh_interval: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
            recovery_delay: Duration::from_millis(DEFAULT_RECOVERY_DELAY_MS),
        }
    }
}

pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}
