//! Timing and retry knobs for the query cache.

use std::time::Duration;

/// Backoff for failed reads: `min(base × 2^attempt, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Extra attempts after the first failure
  pub retries: u32,
  pub base_delay: Duration,
  pub max_delay: Duration,
}

impl RetryPolicy {
  /// Delay before retry number `attempt` (0-based).
  pub fn delay(&self, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    self
      .base_delay
      .checked_mul(factor)
      .unwrap_or(self.max_delay)
      .min(self.max_delay)
  }
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      retries: 1,
      base_delay: Duration::from_millis(1000),
      max_delay: Duration::from_millis(30_000),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
  /// How long a fetched value is served without refetching
  pub stale_time: Duration,
  /// How long an entry without observers survives
  pub gc_time: Duration,
  /// How often the background sweeper looks for idle entries
  pub sweep_interval: Duration,
  pub retry: RetryPolicy,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_time: Duration::from_secs(5 * 60),
      gc_time: Duration::from_secs(10 * 60),
      sweep_interval: Duration::from_secs(60),
      retry: RetryPolicy::default(),
    }
  }
}
