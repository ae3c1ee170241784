use serde::{Deserialize, Serialize};

use super::defaults;

/// Background task scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of workers polling the queue.
    pub workers: usize,
    /// Sleep between polls when every priority class is empty.
    pub idle_poll_ms: u64,
    /// Attempts a retrying handler makes before giving up.
    pub max_attempts: u32,
    /// Base delay for exponential backoff between handler retries.
    pub retry_base_ms: u64,
    /// Upper bound on a single backoff delay.
    pub retry_max_ms: u64,
    /// How long finished tasks stay queryable before the purge sweep drops them.
    pub finished_retention_secs: u64,
    /// Period of the purge sweep. 0 turns it off.
    pub purge_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: defaults::DEFAULT_WORKERS,
            idle_poll_ms: defaults::DEFAULT_IDLE_POLL_MS,
            max_attempts: defaults::DEFAULT_MAX_ATTEMPTS,
            retry_base_ms: defaults::DEFAULT_RETRY_BASE_MS,
            retry_max_ms: defaults::DEFAULT_RETRY_MAX_MS,
            finished_retention_secs: defaults::DEFAULT_FINISHED_RETENTION_SECS,
            purge_interval_ms: defaults::DEFAULT_PURGE_INTERVAL_MS,
        }
    }
}

impl SchedulerConfig {
    /// Backoff delay before attempt number `attempt` (1-based), doubling each time.
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let exp = attempt.saturating_sub(1).min(16);
        self.retry_base_ms
            .saturating_mul(1u64 << exp)
            .min(self.retry_max_ms)
    }
}
