//! One window's highlighting session.
//!
//! A session resolves the window's language once, then loops:
//!
//! * open the edit stream, acquire a layer, highlight the whole body,
//! * watch edits and re-highlight after each debounced burst,
//! * on failure delete the layer, back off, and start over.
//!
//! The backoff resets after every successful initial highlight. The session
//! ends when the window closes (layer cleared), when the window vanishes
//! mid-flight, or when the daemon cancels it (layer deleted).

mod watch;


use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tinct_highlight::compose;
use tinct_language::LanguageId;
use tinct_worker::{Backoff, sleep_or_cancel};
use tokio_util::sync::CancellationToken;

use crate::context::SessionContext;
use crate::layer::{CompositorError, StyleLayer};
use crate::source::{TransportError, WindowHandle, WindowInfo};

/// Failures that end one session attempt and trigger a retry.
#[derive(Debug, Error)]
pub enum SessionError {
	#[error("window source: {0}")]
	Transport(#[from] TransportError),

	#[error("compositor: {0}")]
	Compositor(#[from] CompositorError),
}

impl SessionError {
	/// Returns `true` when the window itself is gone and retrying is pointless.
	fn is_window_gone(&self) -> bool {
		matches!(self, Self::Transport(TransportError::WindowGone(_)))
	}
}

/// How a session attempt ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionExit {
	/// The window closed.
	Closed,
	/// The daemon is shutting down.
	Cancelled,
}

/// Runs the session for `window` until it closes or the daemon cancels.
pub async fn run_session(ctx: Arc<SessionContext>, window: WindowInfo) {
	let Some(language) = resolve_language(&ctx, &window).await else {
		tracing::debug!(window = %window.id, name = %window.name, "no language; session idle");
		return;
	};
	tracing::info!(window = %window.id, name = %window.name, %language, "session.start");

	let mut backoff = ctx.settings.backoff();
	loop {
		match attempt(&ctx, &window, &language, &mut backoff).await {
			Ok(SessionExit::Closed) => {
				tracing::debug!(window = %window.id, "session.closed");
				return;
			}
			Ok(SessionExit::Cancelled) => {
				tracing::debug!(window = %window.id, "session.cancelled");
				return;
			}
			Err(error) => {
				let delay = backoff.next_delay();
				tracing::warn!(
					window = %window.id,
					%error,
					attempt = backoff.attempt(),
					delay = ?delay,
					"session.retry"
				);
				if !sleep_or_cancel(delay, &ctx.cancel).await {
					tracing::debug!(window = %window.id, "session.cancelled");
					return;
				}
			}
		}
	}
}

/// Resolves the window's language by name, then by interpreter line.
///
/// Reading the first line retries with backoff; a vanished window or
/// cancellation yields `None`.
async fn resolve_language(ctx: &SessionContext, window: &WindowInfo) -> Option<LanguageId> {
	if let Some(language) = ctx.resolver.resolve_by_filename(&window.name) {
		return Some(language);
	}

	let mut backoff = ctx.settings.backoff();
	loop {
		let read = async {
			let mut handle = ctx.services.windows.open(window.id).await?;
			handle.read_first_line().await
		};
		match until_cancelled(&ctx.cancel, read).await? {
			Ok(line) => {
				let language = ctx.resolver.resolve_by_interpreter_line(&line);
				tracing::trace!(window = %window.id, line = %line, ?language, "interpreter line");
				return language;
			}
			Err(TransportError::WindowGone(_)) => return None,
			Err(error) => {
				let delay = backoff.next_delay();
				tracing::warn!(window = %window.id, %error, delay = ?delay, "first line read failed");
				if !sleep_or_cancel(delay, &ctx.cancel).await {
					return None;
				}
			}
		}
	}
}

/// One acquire-highlight-watch cycle, with layer cleanup on every exit.
async fn attempt(
	ctx: &SessionContext,
	window: &WindowInfo,
	language: &LanguageId,
	backoff: &mut Backoff,
) -> Result<SessionExit, SessionError> {
	let mut layer = StyleLayer::absent(window.id);
	let outcome = match drive(ctx, window, language, backoff, &mut layer).await {
		Err(error) if error.is_window_gone() => {
			tracing::debug!(window = %window.id, %error, "window vanished");
			Ok(SessionExit::Closed)
		}
		outcome => outcome,
	};
	match outcome {
		Ok(SessionExit::Closed) => layer.clear().await,
		Ok(SessionExit::Cancelled) | Err(_) => layer.delete().await,
	}
	outcome
}

async fn drive(
	ctx: &SessionContext,
	window: &WindowInfo,
	language: &LanguageId,
	backoff: &mut Backoff,
	layer: &mut StyleLayer,
) -> Result<SessionExit, SessionError> {
	let Some(handle) = until_cancelled(&ctx.cancel, ctx.services.windows.open(window.id)).await else {
		return Ok(SessionExit::Cancelled);
	};
	let mut handle = handle?;

	// Subscribe before the first read so edits made during it are not lost.
	let Some(edits) = until_cancelled(&ctx.cancel, handle.edit_notifications()).await else {
		return Ok(SessionExit::Cancelled);
	};
	let edits = edits?;

	let compositor = ctx.services.compositor.as_ref();
	let Some(acquired) = until_cancelled(&ctx.cancel, StyleLayer::acquire(compositor, window.id, &ctx.settings.layer_name)).await
	else {
		return Ok(SessionExit::Cancelled);
	};
	*layer = acquired?;

	let Some(highlighted) = until_cancelled(&ctx.cancel, highlight(ctx, handle.as_mut(), language, layer)).await else {
		return Ok(SessionExit::Cancelled);
	};
	highlighted?;
	backoff.reset();

	watch::watch(ctx, window, language, handle.as_mut(), edits, layer).await
}

/// Reads the body, queries it, and replaces the layer's spans.
pub(crate) async fn highlight(
	ctx: &SessionContext,
	handle: &mut dyn WindowHandle,
	language: &LanguageId,
	layer: &mut StyleLayer,
) -> Result<(), SessionError> {
	let text: Arc<[u8]> = handle.read_full_text().await?.into();
	let captures = ctx.services.annotations.parse_and_query(language, Arc::clone(&text)).await;
	let spans = compose(&captures, &text, &ctx.styles);
	layer.apply(&spans).await?;
	tracing::trace!(bytes = text.len(), captures = captures.len(), spans = spans.len(), "highlight.applied");
	Ok(())
}

/// Awaits `fut` unless `cancel` fires first.
pub(crate) async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
	tokio::select! {
		biased;
		_ = cancel.cancelled() => None,
		out = fut => Some(out),
	}
}
