//! Compositor over a mounted acme-styles file tree.
//!
//! Every operation opens its files afresh and holds nothing between calls,
//! so a layer survives an acme-styles restart as long as its id is
//! re-allocated on the next write.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tinct_highlight::{Span, encode_spans};
use tinct_session::{Compositor, CompositorError, Layer, WindowId};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Default acme-styles mount point.
pub const DEFAULT_STYLES_ROOT: &str = "/mnt/acme-styles";

/// acme-styles, reached through its mount point.
#[derive(Debug, Clone)]
pub struct AcmeStyles {
	root: PathBuf,
}

impl AcmeStyles {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}
}

#[async_trait]
impl Compositor for AcmeStyles {
	async fn open_layer(&self, window: WindowId, name: &str) -> Result<Box<dyn Layer>, CompositorError> {
		if !tokio::fs::try_exists(&self.root).await? {
			return Err(CompositorError::Absent(window));
		}
		let id = allocate(&self.root, window).await?;
		Ok(Box::new(AcmeLayer {
			root: self.root.clone(),
			window,
			id,
			name: name.to_string(),
		}))
	}
}

/// Reads `{window}/layers/new` for a fresh layer id.
async fn allocate(root: &Path, window: WindowId) -> Result<u32, CompositorError> {
	let path = root.join(window.to_string()).join("layers").join("new");
	let text = match tokio::fs::read_to_string(&path).await {
		Ok(text) => text,
		Err(error) if error.kind() == ErrorKind::NotFound => return Err(CompositorError::Absent(window)),
		Err(error) => return Err(error.into()),
	};
	text.trim()
		.parse()
		.map_err(|_| CompositorError::Protocol(format!("layer id {:?} from {}", text.trim(), path.display())))
}

struct AcmeLayer {
	root: PathBuf,
	window: WindowId,
	id: u32,
	name: String,
}

impl AcmeLayer {
	fn file(&self, name: &str) -> PathBuf {
		self.root
			.join(self.window.to_string())
			.join("layers")
			.join(self.id.to_string())
			.join(name)
	}

	fn gone(&self, error: std::io::Error) -> CompositorError {
		if error.kind() == ErrorKind::NotFound {
			CompositorError::LayerGone(self.id)
		} else {
			error.into()
		}
	}

	/// Truncate-writes `text` to the layer's style file in one write.
	///
	/// Opening the style file for writing empties the layer; the new spans
	/// become visible when the file is closed.
	async fn write_style(&self, text: &[u8]) -> std::io::Result<()> {
		let mut file = OpenOptions::new().write(true).truncate(true).open(self.file("style")).await?;
		if !text.is_empty() {
			file.write_all(text).await?;
		}
		file.flush().await
	}
}

#[async_trait]
impl Layer for AcmeLayer {
	fn id(&self) -> u32 {
		self.id
	}

	async fn apply_spans(&mut self, spans: &[Span]) -> Result<(), CompositorError> {
		let text = encode_spans(spans);
		match self.write_style(text.as_bytes()).await {
			Err(error) if error.kind() == ErrorKind::NotFound => {
				let stale = self.id;
				self.id = allocate(&self.root, self.window).await?;
				tracing::debug!(window = %self.window, name = %self.name, stale, fresh = self.id, "layer.reallocated");
				self.write_style(text.as_bytes()).await.map_err(|e| self.gone(e))
			}
			result => result.map_err(CompositorError::from),
		}
	}

	async fn clear(&mut self) -> Result<(), CompositorError> {
		// Opening for write clears; closing flushes the empty layer.
		let file = OpenOptions::new().write(true).open(self.file("clear")).await.map_err(|e| self.gone(e))?;
		drop(file);
		Ok(())
	}

	async fn delete(&mut self) -> Result<(), CompositorError> {
		let mut ctl = OpenOptions::new().write(true).open(self.file("ctl")).await.map_err(|e| self.gone(e))?;
		ctl.write_all(b"delete\n").await?;
		ctl.flush().await?;
		Ok(())
	}
}
