//! Edit watching and debounced re-highlighting.

use tinct_language::LanguageId;
use tinct_worker::TaskClass;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use super::{SessionError, SessionExit, highlight, until_cancelled};
use crate::context::SessionContext;
use crate::debounce::Debouncer;
use crate::layer::StyleLayer;
use crate::source::{EditKind, EditStream, TransportError, WindowHandle, WindowInfo};

/// Edit notifications buffered between the reader task and the session.
///
/// A full buffer already guarantees a pending wake-up, so overflowing
/// edits are dropped.
const EDIT_BUFFER: usize = 32;

#[derive(Debug)]
enum WatchEvent {
	Edit(EditKind),
	Closed,
	Failed(TransportError),
}

/// Re-highlights after each debounced edit burst until the window closes,
/// the edit stream fails, or the session is cancelled.
pub(super) async fn watch(
	ctx: &SessionContext,
	window: &WindowInfo,
	language: &LanguageId,
	handle: &mut dyn WindowHandle,
	edits: Box<dyn EditStream>,
	layer: &mut StyleLayer,
) -> Result<SessionExit, SessionError> {
	let reader_cancel = ctx.cancel.child_token();
	let (tx, mut rx) = mpsc::channel(EDIT_BUFFER);
	let reader = tinct_worker::spawn(TaskClass::Watcher, forward_edits(edits, tx, reader_cancel.clone()));
	let mut debounce = Debouncer::new(ctx.settings.debounce);

	let outcome = loop {
		tokio::select! {
			biased;
			_ = ctx.cancel.cancelled() => break Ok(SessionExit::Cancelled),
			() = debounce.fired() => {
				tracing::trace!(window = %window.id, "debounce.fired");
				match until_cancelled(&ctx.cancel, highlight(ctx, handle, language, layer)).await {
					None => break Ok(SessionExit::Cancelled),
					Some(Err(error)) => break Err(error),
					Some(Ok(())) => {}
				}
			}
			event = rx.recv() => match event {
				Some(WatchEvent::Edit(kind)) => {
					if debounce.arm() {
						tracing::trace!(window = %window.id, ?kind, "debounce.armed");
					}
				}
				Some(WatchEvent::Failed(error)) => break Err(error.into()),
				Some(WatchEvent::Closed) | None => break Ok(SessionExit::Closed),
			},
		}
	};

	// Dropping the receiver unblocks a reader parked on a terminal send.
	drop(rx);
	reader_cancel.cancel();
	if let Err(error) = reader.await {
		tracing::warn!(window = %window.id, %error, "edit reader task failed");
	}
	outcome
}

async fn forward_edits(mut edits: Box<dyn EditStream>, tx: mpsc::Sender<WatchEvent>, cancel: CancellationToken) {
	loop {
		let next = tokio::select! {
			biased;
			_ = cancel.cancelled() => return,
			next = edits.next_edit() => next,
		};
		match next {
			Some(Ok(kind)) => match tx.try_send(WatchEvent::Edit(kind)) {
				Ok(()) | Err(TrySendError::Full(_)) => {}
				Err(TrySendError::Closed(_)) => return,
			},
			Some(Err(error)) => {
				let _ = tx.send(WatchEvent::Failed(error)).await;
				return;
			}
			None => {
				let _ = tx.send(WatchEvent::Closed).await;
				return;
			}
		}
	}
}
