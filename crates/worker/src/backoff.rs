//! Full-jitter truncated exponential backoff.
//!
//! Each delay is drawn uniformly from `[0, min(cap, base * 2^attempt)]`.
//! Many sessions retrying against the same restarted service therefore
//! scatter across the whole window instead of clustering near the ceiling.

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

/// Retry delay generator owned by a single retry loop.
#[derive(Debug, Clone)]
pub struct Backoff {
	base: Duration,
	cap: Duration,
	attempt: u32,
}

impl Backoff {
	/// Creates a generator starting at `base` and never exceeding `cap`.
	pub fn new(base: Duration, cap: Duration) -> Self {
		Self { base, cap, attempt: 0 }
	}

	/// Number of delays handed out since the last reset.
	pub const fn attempt(&self) -> u32 {
		self.attempt
	}

	/// Upper bound of the next delay, `min(cap, base * 2^attempt)`.
	pub fn ceiling(&self) -> Duration {
		1u32.checked_shl(self.attempt)
			.and_then(|factor| self.base.checked_mul(factor))
			.map_or(self.cap, |ceiling| ceiling.min(self.cap))
	}

	/// Draws the next delay and advances the attempt counter.
	pub fn next_delay(&mut self) -> Duration {
		let ceiling = self.ceiling();
		self.attempt = self.attempt.saturating_add(1);
		let nanos = u64::try_from(ceiling.as_nanos()).unwrap_or(u64::MAX);
		if nanos == 0 {
			return Duration::ZERO;
		}
		Duration::from_nanos(rand::thread_rng().gen_range(0..=nanos))
	}

	/// Returns to the initial state so the next failure starts from `base`.
	pub fn reset(&mut self) {
		self.attempt = 0;
	}
}

/// Sleeps for `delay` unless `cancel` fires first.
///
/// Returns `true` when the full delay elapsed and `false` on cancellation.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
	tokio::select! {
		biased;
		_ = cancel.cancelled() => false,
		_ = tokio::time::sleep(delay) => true,
	}
}
