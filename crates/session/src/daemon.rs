//! Window discovery and the reconnect loop.

use std::sync::Arc;

use tinct_worker::{Backoff, sleep_or_cancel};

use crate::context::SessionContext;
use crate::session::until_cancelled;
use crate::source::TransportError;

/// Supervisor: starts a session for every open and newly opened window.
///
/// The editor connection is re-established with backoff whenever window
/// discovery fails; running sessions are unaffected by reconnects.
pub struct Daemon {
	ctx: Arc<SessionContext>,
}

impl Daemon {
	pub fn new(ctx: Arc<SessionContext>) -> Self {
		Self { ctx }
	}

	/// Runs until the context is cancelled, then drains every session.
	pub async fn run(self) {
		let mut backoff = self.ctx.settings.backoff();
		while !self.ctx.cancel.is_cancelled() {
			let error = match self.follow(&mut backoff).await {
				Ok(()) => TransportError::Unavailable("window event stream ended".to_string()),
				Err(error) => error,
			};
			if self.ctx.cancel.is_cancelled() {
				break;
			}
			let delay = backoff.next_delay();
			tracing::warn!(%error, attempt = backoff.attempt(), delay = ?delay, "discovery.reconnect");
			if !sleep_or_cancel(delay, &self.ctx.cancel).await {
				break;
			}
		}
		tracing::info!(sessions = self.ctx.active_sessions(), "daemon.stopping");
		self.ctx.shutdown().await;
	}

	/// One connection: subscribe, seed from the open windows, then follow
	/// new ones. Returns `Ok` on cancellation or when the stream ends.
	async fn follow(&self, backoff: &mut Backoff) -> Result<(), TransportError> {
		let cancel = &self.ctx.cancel;
		let windows = self.ctx.services.windows.as_ref();

		// Subscribe first: a window opened while listing shows up in both
		// places, and the registry drops the duplicate start.
		let Some(events) = until_cancelled(cancel, windows.watch_new_windows()).await else {
			return Ok(());
		};
		let mut events = events?;
		let Some(open) = until_cancelled(cancel, windows.list_windows()).await else {
			return Ok(());
		};
		let open = open?;
		backoff.reset();

		let mut started = 0usize;
		for window in open {
			started += usize::from(self.ctx.start(window));
		}
		tracing::info!(started, "discovery.connected");

		loop {
			match until_cancelled(cancel, events.next_window()).await {
				None | Some(None) => return Ok(()),
				Some(Some(Ok(window))) => {
					self.ctx.start(window);
				}
				Some(Some(Err(error))) => return Err(error),
			}
		}
	}
}
