//! Editor-side and parser-side collaborator contracts.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tinct_highlight::Capture;
use tinct_language::LanguageId;

/// Editor window identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// A window as announced by the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
	pub id: WindowId,
	/// File name from the window tag; may be empty for scratch windows.
	pub name: String,
}

impl WindowInfo {
	pub fn new(id: u32, name: impl Into<String>) -> Self {
		Self {
			id: WindowId(id),
			name: name.into(),
		}
	}
}

/// Body edit notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
	Insert,
	Delete,
}

/// Failures talking to the editor.
#[derive(Debug, Error)]
pub enum TransportError {
	/// The window was closed; there is nothing left to retry.
	#[error("window {0} no longer exists")]
	WindowGone(WindowId),

	/// The editor's file service cannot be reached.
	#[error("editor unavailable: {0}")]
	Unavailable(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// The editor sent something that does not parse.
	#[error("malformed {what}: {line:?}")]
	Protocol { what: &'static str, line: String },
}

/// Editor connection: window discovery and per-window handles.
#[async_trait]
pub trait WindowSource: Send + Sync + 'static {
	/// Windows open right now.
	async fn list_windows(&self) -> Result<Vec<WindowInfo>, TransportError>;

	/// Stream of windows opened from now on.
	///
	/// The stream ends or fails when the editor connection drops; callers
	/// reconnect by calling this again.
	async fn watch_new_windows(&self) -> Result<Box<dyn WindowEvents>, TransportError>;

	/// Opens a dedicated handle on one window.
	///
	/// Fails with [`TransportError::WindowGone`] if the window does not exist.
	async fn open(&self, id: WindowId) -> Result<Box<dyn WindowHandle>, TransportError>;
}

/// Lazily read stream of window-opened events.
#[async_trait]
pub trait WindowEvents: Send {
	/// Next opened window, or `None` once the stream has ended.
	async fn next_window(&mut self) -> Option<Result<WindowInfo, TransportError>>;
}

/// Access to one window's text and edit notifications.
#[async_trait]
pub trait WindowHandle: Send {
	/// Reads the whole body.
	async fn read_full_text(&mut self) -> Result<Vec<u8>, TransportError>;

	/// Reads the first line of the body, without its newline.
	async fn read_first_line(&mut self) -> Result<String, TransportError> {
		let text = self.read_full_text().await?;
		let line = text.split(|&b| b == b'\n').next().unwrap_or_default();
		Ok(String::from_utf8_lossy(line).into_owned())
	}

	/// Opens the body edit stream.
	///
	/// The stream ends cleanly when the window is closed.
	async fn edit_notifications(&mut self) -> Result<Box<dyn EditStream>, TransportError>;
}

/// Lazily read stream of body edits.
#[async_trait]
pub trait EditStream: Send {
	/// Next edit, `None` once the window has closed.
	async fn next_edit(&mut self) -> Option<Result<EditKind, TransportError>>;
}

/// Parser/query engine producing captures.
#[async_trait]
pub trait AnnotationSource: Send + Sync + 'static {
	/// Parses `source` as `language` and returns captures in priority order.
	///
	/// Languages without a registered query produce no captures.
	async fn parse_and_query(&self, language: &LanguageId, source: Arc<[u8]>) -> Vec<Capture>;

	/// Languages this source can annotate.
	fn languages(&self) -> Vec<LanguageId>;
}
