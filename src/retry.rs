//! Retry/backoff policy shared by artifact loaders.
//!
//! Backoff is linear in the retry number: retry `n` waits `n * base_delay`,
//! so each wait is longer than the previous one by a fixed increment. A fixed
//! initial delay precedes the first attempt and is independent of backoff.

use gitfolio_config::ArtifactConfig;
use std::time::Duration;

/// Bounded retry schedule for a single eventually-available resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first failed attempt.
    pub max_retries: u32,
    /// Backoff increment.
    pub base_delay: Duration,
    /// Wait before the first attempt.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ArtifactConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default()
        }
    }

    pub fn from_config(config: &ArtifactConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
        }
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Delay before retry number `retry` (1-based). Retry 0 is the first
    /// attempt and has no backoff.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }

    /// Whether another retry may be scheduled after `retries_so_far`.
    pub fn allows_retry(&self, retries_so_far: u32) -> bool {
        retries_so_far < self.max_retries
    }

    /// Total backoff scheduled across the first `retries` retries,
    /// excluding the initial delay.
    pub fn total_backoff(&self, retries: u32) -> Duration {
        (1..=retries).map(|n| self.delay_for_retry(n)).sum()
    }

    /// Worst-case scheduled wait for a resource that never appears.
    pub fn worst_case_wait(&self) -> Duration {
        self.initial_delay + self.total_backoff(self.max_retries)
    }
}
