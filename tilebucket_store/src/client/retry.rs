use std::time::Duration;
use tilebucket_core::config::{
	DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, StoreConfig,
};

/// Timeout and retry settings of an [`ObjectStoreClient`](crate::ObjectStoreClient).
///
/// A call makes at most `max_retries + 1` attempts. The wait before retry `n` is
/// `initial_backoff * 2^(n-1)`, capped at `max_backoff`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Limit for a single attempt.
	pub timeout: Duration,
	pub max_retries: u32,
	pub initial_backoff: Duration,
	pub max_backoff: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		RetryPolicy {
			timeout: DEFAULT_TIMEOUT,
			max_retries: DEFAULT_MAX_RETRIES,
			initial_backoff: DEFAULT_INITIAL_BACKOFF,
			max_backoff: DEFAULT_MAX_BACKOFF,
		}
	}
}

impl RetryPolicy {
	pub fn from_config(config: &StoreConfig) -> RetryPolicy {
		RetryPolicy {
			timeout: config.timeout(),
			max_retries: config.max_retries(),
			initial_backoff: config.initial_backoff(),
			max_backoff: config.max_backoff(),
		}
	}

	/// Wait before retry number `retry` (starting at 1).
	pub fn backoff(&self, retry: u32) -> Duration {
		let factor = 1u32 << retry.saturating_sub(1).min(20);
		self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
	}

	pub fn max_attempts(&self) -> u32 {
		self.max_retries.saturating_add(1)
	}
}
