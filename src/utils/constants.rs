//! Shared constants and invariants

/// Minimum proof length accepted as valid. Shorter outputs are discarded
/// and counted as failed attempts, never cached.
pub const MIN_PROOF_LENGTH: usize = 160;

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_OVERALL_DEADLINE_MS: u64 = 120_000;
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BACKOFF_MS: u64 = 2_000;
pub const DEFAULT_RECOVERY_DELAY_MS: u64 = 5_000;
