//! Shared session state and session startup.

use std::sync::Arc;
use std::time::Duration;

use tinct_highlight::StyleTable;
use tinct_language::LanguageResolver;
use tinct_worker::{Backoff, ClaimSet, TaskClass};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::layer::Compositor;
use crate::session::run_session;
use crate::source::{AnnotationSource, WindowId, WindowInfo, WindowSource};

/// Layer name used when none is configured.
pub const DEFAULT_LAYER_NAME: &str = "treesitter";

/// Session timing and naming knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
	/// Name passed to the compositor for each allocated layer.
	pub layer_name: String,
	/// Quiet period between the first edit of a burst and the recompute.
	pub debounce: Duration,
	/// First retry ceiling.
	pub backoff_base: Duration,
	/// Largest retry ceiling.
	pub backoff_cap: Duration,
}

impl Default for SessionSettings {
	fn default() -> Self {
		Self {
			layer_name: DEFAULT_LAYER_NAME.to_string(),
			debounce: Duration::from_millis(200),
			backoff_base: Duration::from_millis(200),
			backoff_cap: Duration::from_secs(30),
		}
	}
}

impl SessionSettings {
	/// A fresh retry policy.
	pub fn backoff(&self) -> Backoff {
		Backoff::new(self.backoff_base, self.backoff_cap)
	}
}

/// External collaborators every session talks to.
#[derive(Clone)]
pub struct Services {
	pub windows: Arc<dyn WindowSource>,
	pub compositor: Arc<dyn Compositor>,
	pub annotations: Arc<dyn AnnotationSource>,
}

/// State shared by the supervisor and all sessions.
///
/// Holds the active-window registry: a window has at most one session, and
/// its entry is released when that session's task finishes.
pub struct SessionContext {
	pub(crate) services: Services,
	pub(crate) resolver: LanguageResolver,
	pub(crate) styles: StyleTable,
	pub(crate) settings: SessionSettings,
	pub(crate) cancel: CancellationToken,
	active: ClaimSet<WindowId>,
	tracker: TaskTracker,
}

impl SessionContext {
	pub fn new(
		services: Services,
		resolver: LanguageResolver,
		styles: StyleTable,
		settings: SessionSettings,
		cancel: CancellationToken,
	) -> Arc<Self> {
		Arc::new(Self {
			services,
			resolver,
			styles,
			settings,
			cancel,
			active: ClaimSet::new(),
			tracker: TaskTracker::new(),
		})
	}

	pub fn settings(&self) -> &SessionSettings {
		&self.settings
	}

	pub fn cancel_token(&self) -> &CancellationToken {
		&self.cancel
	}

	/// Starts a session for `window` unless one is already active.
	///
	/// Returns whether a session was started. Nothing starts once shutdown
	/// has begun.
	pub fn start(self: &Arc<Self>, window: WindowInfo) -> bool {
		if self.cancel.is_cancelled() {
			return false;
		}
		let Some(claim) = self.active.claim(window.id) else {
			tracing::trace!(window = %window.id, "session already active");
			return false;
		};
		tracing::debug!(window = %window.id, name = %window.name, "session.spawn");
		let ctx = Arc::clone(self);
		tinct_worker::spawn(
			TaskClass::Session,
			self.tracker.track_future(async move {
				let _claim = claim;
				run_session(ctx, window).await;
			}),
		);
		true
	}

	/// Returns whether `window` has a running session.
	pub fn is_active(&self, window: WindowId) -> bool {
		self.active.contains(&window)
	}

	/// Number of running sessions.
	pub fn active_sessions(&self) -> usize {
		self.active.len()
	}

	/// Cancels every session and waits for all of them to finish.
	pub async fn shutdown(&self) {
		self.cancel.cancel();
		self.tracker.close();
		self.tracker.wait().await;
		tracing::debug!("sessions drained");
	}
}
