//! Compositor contract and the session-owned style layer handle.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tinct_highlight::Span;

use crate::source::WindowId;

/// Upper bound on best-effort cleanup calls so a wedged compositor cannot
/// hold a finishing session hostage.
const CLEANUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Failures talking to the style compositor.
#[derive(Debug, Error)]
pub enum CompositorError {
	/// No compositor is serving this window.
	#[error("compositor absent for window {0}")]
	Absent(WindowId),

	/// The layer was dropped on the compositor side (usually a restart).
	#[error("layer {0} no longer exists")]
	LayerGone(u32),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("compositor protocol: {0}")]
	Protocol(String),
}

/// Style compositor: hands out per-window layers.
#[async_trait]
pub trait Compositor: Send + Sync + 'static {
	/// Allocates a new layer named `name` over `window`.
	async fn open_layer(&self, window: WindowId, name: &str) -> Result<Box<dyn Layer>, CompositorError>;
}

/// One allocated style layer.
#[async_trait]
pub trait Layer: Send + Sync {
	/// Compositor-assigned layer id.
	fn id(&self) -> u32;

	/// Replaces the layer's spans atomically.
	async fn apply_spans(&mut self, spans: &[Span]) -> Result<(), CompositorError>;

	/// Removes every span but keeps the layer allocated.
	async fn clear(&mut self) -> Result<(), CompositorError>;

	/// Releases the layer.
	async fn delete(&mut self) -> Result<(), CompositorError>;
}

/// A session's layer, possibly absent.
///
/// Every operation on an absent layer is a successful no-op, so callers
/// never branch on presence. Cleanup operations are best-effort and only
/// log failures.
pub struct StyleLayer {
	window: WindowId,
	inner: Option<Box<dyn Layer>>,
}

impl StyleLayer {
	/// A handle with no layer behind it.
	pub fn absent(window: WindowId) -> Self {
		Self { window, inner: None }
	}

	/// Allocates a fresh layer.
	pub async fn acquire(compositor: &dyn Compositor, window: WindowId, name: &str) -> Result<Self, CompositorError> {
		let layer = compositor.open_layer(window, name).await?;
		tracing::debug!(%window, layer = layer.id(), name, "layer.acquired");
		Ok(Self {
			window,
			inner: Some(layer),
		})
	}

	pub fn is_present(&self) -> bool {
		self.inner.is_some()
	}

	/// Compositor id of the held layer.
	pub fn id(&self) -> Option<u32> {
		self.inner.as_ref().map(|layer| layer.id())
	}

	/// Replaces the layer's spans.
	pub async fn apply(&mut self, spans: &[Span]) -> Result<(), CompositorError> {
		match &mut self.inner {
			Some(layer) => layer.apply_spans(spans).await,
			None => Ok(()),
		}
	}

	/// Best-effort clear; the layer stays held.
	pub async fn clear(&mut self) {
		let Some(layer) = &mut self.inner else {
			return;
		};
		let id = layer.id();
		match tokio::time::timeout(CLEANUP_TIMEOUT, layer.clear()).await {
			Ok(Ok(())) => tracing::trace!(window = %self.window, layer = id, "layer.cleared"),
			Ok(Err(error)) => tracing::debug!(window = %self.window, layer = id, %error, "layer clear failed"),
			Err(_) => tracing::debug!(window = %self.window, layer = id, "layer clear timed out"),
		}
	}

	/// Best-effort delete; the handle is absent afterwards.
	pub async fn delete(&mut self) {
		let Some(mut layer) = self.inner.take() else {
			return;
		};
		let id = layer.id();
		match tokio::time::timeout(CLEANUP_TIMEOUT, layer.delete()).await {
			Ok(Ok(())) => tracing::debug!(window = %self.window, layer = id, "layer.deleted"),
			Ok(Err(error)) => tracing::debug!(window = %self.window, layer = id, %error, "layer delete failed"),
			Err(_) => tracing::debug!(window = %self.window, layer = id, "layer delete timed out"),
		}
	}
}
