//! Window source over a mounted acme file tree.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tinct_session::{EditKind, EditStream, TransportError, WindowEvents, WindowHandle, WindowId, WindowInfo, WindowSource};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use crate::protocol::{parse_edit_line, parse_index_line, parse_log_line};

/// Default acme mount point.
pub const DEFAULT_ACME_ROOT: &str = "/mnt/acme";

/// acme's file server, reached through its mount point.
///
/// Every [`WindowHandle`] opens its own files, so sessions never share file
/// handles.
#[derive(Debug, Clone)]
pub struct AcmeWindows {
	root: PathBuf,
}

impl AcmeWindows {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// Maps a failure on a root-level file: a missing file means acme is
	/// not mounted.
	fn root_error(&self, error: std::io::Error) -> TransportError {
		if error.kind() == ErrorKind::NotFound {
			TransportError::Unavailable(format!("acme not mounted at {}", self.root.display()))
		} else {
			error.into()
		}
	}
}

/// Maps a failure on a per-window file: a missing file means the window closed.
fn window_error(id: WindowId, error: std::io::Error) -> TransportError {
	if error.kind() == ErrorKind::NotFound {
		TransportError::WindowGone(id)
	} else {
		error.into()
	}
}

#[async_trait]
impl WindowSource for AcmeWindows {
	async fn list_windows(&self) -> Result<Vec<WindowInfo>, TransportError> {
		let index = tokio::fs::read_to_string(self.root.join("index"))
			.await
			.map_err(|e| self.root_error(e))?;
		index
			.lines()
			.filter(|line| !line.trim().is_empty())
			.map(parse_index_line)
			.collect()
	}

	async fn watch_new_windows(&self) -> Result<Box<dyn WindowEvents>, TransportError> {
		let log = File::open(self.root.join("log")).await.map_err(|e| self.root_error(e))?;
		Ok(Box::new(AcmeLog {
			lines: BufReader::new(log).lines(),
		}))
	}

	async fn open(&self, id: WindowId) -> Result<Box<dyn WindowHandle>, TransportError> {
		let dir = self.root.join(id.to_string());
		let meta = tokio::fs::metadata(&dir).await.map_err(|e| window_error(id, e))?;
		if !meta.is_dir() {
			return Err(TransportError::WindowGone(id));
		}
		Ok(Box::new(AcmeWindow { id, dir }))
	}
}

/// The global `log` file, read line by line as acme appends to it.
struct AcmeLog {
	lines: Lines<BufReader<File>>,
}

#[async_trait]
impl WindowEvents for AcmeLog {
	async fn next_window(&mut self) -> Option<Result<WindowInfo, TransportError>> {
		loop {
			let line = match self.lines.next_line().await {
				Ok(Some(line)) => line,
				Ok(None) => return None,
				Err(error) => return Some(Err(error.into())),
			};
			match parse_log_line(&line) {
				Ok(Some(window)) => return Some(Ok(window)),
				Ok(None) => {}
				Err(error) => return Some(Err(error)),
			}
		}
	}
}

struct AcmeWindow {
	id: WindowId,
	dir: PathBuf,
}

#[async_trait]
impl WindowHandle for AcmeWindow {
	async fn read_full_text(&mut self) -> Result<Vec<u8>, TransportError> {
		tokio::fs::read(self.dir.join("body")).await.map_err(|e| window_error(self.id, e))
	}

	async fn read_first_line(&mut self) -> Result<String, TransportError> {
		let body = File::open(self.dir.join("body")).await.map_err(|e| window_error(self.id, e))?;
		let mut line = Vec::new();
		BufReader::new(body)
			.read_until(b'\n', &mut line)
			.await
			.map_err(|e| window_error(self.id, e))?;
		if line.last() == Some(&b'\n') {
			line.pop();
		}
		Ok(String::from_utf8_lossy(&line).into_owned())
	}

	async fn edit_notifications(&mut self) -> Result<Box<dyn EditStream>, TransportError> {
		let log = File::open(self.dir.join("log")).await.map_err(|e| window_error(self.id, e))?;
		Ok(Box::new(AcmeEditLog {
			id: self.id,
			lines: BufReader::new(log).lines(),
		}))
	}
}

/// A window's `log` file. acme ends it when the window closes.
struct AcmeEditLog {
	id: WindowId,
	lines: Lines<BufReader<File>>,
}

#[async_trait]
impl EditStream for AcmeEditLog {
	async fn next_edit(&mut self) -> Option<Result<EditKind, TransportError>> {
		loop {
			match self.lines.next_line().await {
				Ok(Some(line)) => {
					if let Some(kind) = parse_edit_line(&line) {
						return Some(Ok(kind));
					}
				}
				Ok(None) => return None,
				Err(error) => return Some(Err(window_error(self.id, error))),
			}
		}
	}
}
