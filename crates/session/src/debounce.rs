//! Trailing-edge edit debouncer.

use std::future;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};

/// Collapses edit bursts into one recompute.
///
/// The first edit after a quiet spell arms a deadline `quiet` in the future;
/// further edits before the deadline are absorbed. The deadline does not move,
/// so a continuous edit stream still recomputes once per `quiet`.
#[derive(Debug)]
pub struct Debouncer {
	quiet: Duration,
	deadline: Option<Instant>,
}

impl Debouncer {
	pub fn new(quiet: Duration) -> Self {
		Self { quiet, deadline: None }
	}

	/// Records an edit. Returns `true` if this edit armed the timer.
	pub fn arm(&mut self) -> bool {
		if self.deadline.is_some() {
			return false;
		}
		self.deadline = Some(Instant::now() + self.quiet);
		true
	}

	pub fn is_armed(&self) -> bool {
		self.deadline.is_some()
	}

	/// Resolves once the armed deadline passes and disarms the timer.
	///
	/// Pending forever while disarmed, which makes it safe as a
	/// `tokio::select!` branch. Cancel-safe: dropping the future before it
	/// completes leaves the deadline armed.
	pub async fn fired(&mut self) {
		match self.deadline {
			Some(deadline) => {
				sleep_until(deadline).await;
				self.deadline = None;
			}
			None => future::pending().await,
		}
	}
}
