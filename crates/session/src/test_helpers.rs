//! In-memory collaborators for session tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tinct_highlight::{Capture, Span, StyleTable};
use tinct_language::{LanguageId, LanguageResolver};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::context::{Services, SessionContext, SessionSettings};
use crate::layer::{Compositor, CompositorError, Layer};
use crate::source::{
	AnnotationSource, EditKind, EditStream, TransportError, WindowEvents, WindowHandle, WindowId, WindowInfo, WindowSource,
};

/// Polls `cond` under the paused test clock until it holds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
	for _ in 0..2000 {
		if cond() {
			return;
		}
		tokio::time::sleep(Duration::from_millis(5)).await;
	}
	panic!("condition not reached within 10s of test time");
}

/// Settings with short retry waits.
pub fn fast_settings() -> SessionSettings {
	SessionSettings {
		layer_name: "treesitter".to_string(),
		debounce: Duration::from_millis(200),
		backoff_base: Duration::from_millis(10),
		backoff_cap: Duration::from_millis(100),
	}
}

/// A session context wired to fakes. `.rs` and `.py` names resolve.
pub struct Harness {
	pub windows: Arc<FakeWindows>,
	pub compositor: Arc<FakeCompositor>,
	pub annotations: Arc<FakeAnnotations>,
	pub ctx: Arc<SessionContext>,
}

impl Harness {
	pub fn new() -> Self {
		Self::with_settings(fast_settings())
	}

	pub fn with_settings(settings: SessionSettings) -> Self {
		let windows = Arc::new(FakeWindows::new());
		let compositor = Arc::new(FakeCompositor::new());
		let annotations = Arc::new(FakeAnnotations::default());
		let mut resolver = LanguageResolver::new(annotations.languages());
		resolver.add_handler(r"\.rs$", "rust").unwrap();
		resolver.add_handler(r"\.py$", "python").unwrap();
		let services = Services {
			windows: windows.clone(),
			compositor: compositor.clone(),
			annotations: annotations.clone(),
		};
		let ctx = SessionContext::new(services, resolver, StyleTable::builtin(), settings, CancellationToken::new());
		Self {
			windows,
			compositor,
			annotations,
			ctx,
		}
	}
}

struct FakeWindow {
	info: WindowInfo,
	text: Vec<u8>,
	edit_subscribers: Vec<mpsc::UnboundedSender<Result<EditKind, TransportError>>>,
	reads: usize,
}

struct WindowsState {
	available: bool,
	windows: BTreeMap<WindowId, FakeWindow>,
	watchers: Vec<mpsc::UnboundedSender<WindowInfo>>,
}

/// Scriptable editor.
pub struct FakeWindows {
	state: Arc<Mutex<WindowsState>>,
}

impl FakeWindows {
	pub fn new() -> Self {
		Self {
			state: Arc::new(Mutex::new(WindowsState {
				available: true,
				windows: BTreeMap::new(),
				watchers: Vec::new(),
			})),
		}
	}

	fn lock(&self) -> MutexGuard<'_, WindowsState> {
		self.state.lock().unwrap()
	}

	/// While unavailable, every call fails with [`TransportError::Unavailable`].
	pub fn set_available(&self, available: bool) {
		self.lock().available = available;
	}

	/// Adds a window without announcing it.
	pub fn add_window(&self, info: WindowInfo, text: impl Into<Vec<u8>>) {
		let window = FakeWindow {
			info: info.clone(),
			text: text.into(),
			edit_subscribers: Vec::new(),
			reads: 0,
		};
		self.lock().windows.insert(info.id, window);
	}

	/// Adds a window and announces it to every event stream.
	pub fn announce(&self, info: WindowInfo, text: impl Into<Vec<u8>>) {
		self.add_window(info.clone(), text);
		self.lock().watchers.retain(|tx| tx.send(info.clone()).is_ok());
	}

	/// Ends every open window event stream.
	pub fn end_event_streams(&self) {
		self.lock().watchers.clear();
	}

	pub fn set_text(&self, id: WindowId, text: impl Into<Vec<u8>>) {
		if let Some(window) = self.lock().windows.get_mut(&id) {
			window.text = text.into();
		}
	}

	/// Delivers one insert notification to every edit stream on `id`.
	pub fn edit(&self, id: WindowId) {
		if let Some(window) = self.lock().windows.get_mut(&id) {
			window.edit_subscribers.retain(|tx| tx.send(Ok(EditKind::Insert)).is_ok());
		}
	}

	/// Fails every edit stream on `id`.
	pub fn fail_edits(&self, id: WindowId, message: &str) {
		if let Some(window) = self.lock().windows.get_mut(&id) {
			for tx in window.edit_subscribers.drain(..) {
				let _ = tx.send(Err(TransportError::Unavailable(message.to_string())));
			}
		}
	}

	/// Closes the window, ending its edit streams.
	pub fn close(&self, id: WindowId) {
		self.lock().windows.remove(&id);
	}

	/// Full-text reads served for `id`.
	pub fn reads(&self, id: WindowId) -> usize {
		self.lock().windows.get(&id).map_or(0, |w| w.reads)
	}

	/// Live edit streams on `id`.
	pub fn edit_streams(&self, id: WindowId) -> usize {
		self.lock().windows.get(&id).map_or(0, |w| w.edit_subscribers.iter().filter(|tx| !tx.is_closed()).count())
	}
}

fn reachable(state: &WindowsState) -> Result<(), TransportError> {
	if state.available {
		Ok(())
	} else {
		Err(TransportError::Unavailable("fake editor offline".to_string()))
	}
}

#[async_trait]
impl WindowSource for FakeWindows {
	async fn list_windows(&self) -> Result<Vec<WindowInfo>, TransportError> {
		let state = self.lock();
		reachable(&state)?;
		Ok(state.windows.values().map(|w| w.info.clone()).collect())
	}

	async fn watch_new_windows(&self) -> Result<Box<dyn WindowEvents>, TransportError> {
		let mut state = self.lock();
		reachable(&state)?;
		let (tx, rx) = mpsc::unbounded_channel();
		state.watchers.push(tx);
		Ok(Box::new(FakeWindowEvents { rx }))
	}

	async fn open(&self, id: WindowId) -> Result<Box<dyn WindowHandle>, TransportError> {
		let state = self.lock();
		reachable(&state)?;
		if !state.windows.contains_key(&id) {
			return Err(TransportError::WindowGone(id));
		}
		Ok(Box::new(FakeHandle {
			id,
			state: Arc::clone(&self.state),
		}))
	}
}

struct FakeWindowEvents {
	rx: mpsc::UnboundedReceiver<WindowInfo>,
}

#[async_trait]
impl WindowEvents for FakeWindowEvents {
	async fn next_window(&mut self) -> Option<Result<WindowInfo, TransportError>> {
		self.rx.recv().await.map(Ok)
	}
}

struct FakeHandle {
	id: WindowId,
	state: Arc<Mutex<WindowsState>>,
}

#[async_trait]
impl WindowHandle for FakeHandle {
	async fn read_full_text(&mut self) -> Result<Vec<u8>, TransportError> {
		let mut state = self.state.lock().unwrap();
		reachable(&state)?;
		let window = state.windows.get_mut(&self.id).ok_or(TransportError::WindowGone(self.id))?;
		window.reads += 1;
		Ok(window.text.clone())
	}

	async fn edit_notifications(&mut self) -> Result<Box<dyn EditStream>, TransportError> {
		let mut state = self.state.lock().unwrap();
		reachable(&state)?;
		let window = state.windows.get_mut(&self.id).ok_or(TransportError::WindowGone(self.id))?;
		let (tx, rx) = mpsc::unbounded_channel();
		window.edit_subscribers.push(tx);
		Ok(Box::new(FakeEditStream { rx }))
	}
}

struct FakeEditStream {
	rx: mpsc::UnboundedReceiver<Result<EditKind, TransportError>>,
}

#[async_trait]
impl EditStream for FakeEditStream {
	async fn next_edit(&mut self) -> Option<Result<EditKind, TransportError>> {
		self.rx.recv().await
	}
}

/// Observable state of one fake layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSnapshot {
	pub id: u32,
	pub window: WindowId,
	pub name: String,
	pub spans: Vec<Span>,
	pub applies: usize,
	pub clears: usize,
	pub deleted: bool,
	/// Dropped by a simulated compositor restart.
	pub vanished: bool,
}

struct CompositorState {
	available: bool,
	next_id: u32,
	layers: BTreeMap<u32, LayerSnapshot>,
}

/// Scriptable style compositor.
pub struct FakeCompositor {
	state: Arc<Mutex<CompositorState>>,
}

impl FakeCompositor {
	pub fn new() -> Self {
		Self {
			state: Arc::new(Mutex::new(CompositorState {
				available: true,
				next_id: 1,
				layers: BTreeMap::new(),
			})),
		}
	}

	fn lock(&self) -> MutexGuard<'_, CompositorState> {
		self.state.lock().unwrap()
	}

	/// While unavailable, allocation fails with [`CompositorError::Absent`].
	pub fn set_available(&self, available: bool) {
		self.lock().available = available;
	}

	/// Simulates a compositor restart: every allocated layer disappears.
	pub fn vanish_layers(&self) {
		for layer in self.lock().layers.values_mut() {
			layer.vanished = true;
		}
	}

	pub fn layer(&self, id: u32) -> Option<LayerSnapshot> {
		self.lock().layers.get(&id).cloned()
	}

	/// Every layer ever allocated on `window`, oldest first.
	pub fn layers_for(&self, window: WindowId) -> Vec<LayerSnapshot> {
		self.lock().layers.values().filter(|l| l.window == window).cloned().collect()
	}

	/// Layers on `window` that are neither deleted nor vanished.
	pub fn live_layers(&self, window: WindowId) -> usize {
		self.layers_for(window).iter().filter(|l| !l.deleted && !l.vanished).count()
	}
}

#[async_trait]
impl Compositor for FakeCompositor {
	async fn open_layer(&self, window: WindowId, name: &str) -> Result<Box<dyn Layer>, CompositorError> {
		let mut state = self.lock();
		if !state.available {
			return Err(CompositorError::Absent(window));
		}
		let id = state.next_id;
		state.next_id += 1;
		state.layers.insert(
			id,
			LayerSnapshot {
				id,
				window,
				name: name.to_string(),
				spans: Vec::new(),
				applies: 0,
				clears: 0,
				deleted: false,
				vanished: false,
			},
		);
		Ok(Box::new(FakeLayer {
			id,
			state: Arc::clone(&self.state),
		}))
	}
}

struct FakeLayer {
	id: u32,
	state: Arc<Mutex<CompositorState>>,
}

impl FakeLayer {
	fn with_layer<T>(&self, f: impl FnOnce(&mut LayerSnapshot) -> T) -> Result<T, CompositorError> {
		let mut state = self.state.lock().unwrap();
		match state.layers.get_mut(&self.id) {
			Some(layer) if !layer.vanished && !layer.deleted => Ok(f(layer)),
			_ => Err(CompositorError::LayerGone(self.id)),
		}
	}
}

#[async_trait]
impl Layer for FakeLayer {
	fn id(&self) -> u32 {
		self.id
	}

	async fn apply_spans(&mut self, spans: &[Span]) -> Result<(), CompositorError> {
		self.with_layer(|layer| {
			layer.spans = spans.to_vec();
			layer.applies += 1;
		})
	}

	async fn clear(&mut self) -> Result<(), CompositorError> {
		self.with_layer(|layer| {
			layer.spans.clear();
			layer.clears += 1;
		})
	}

	async fn delete(&mut self) -> Result<(), CompositorError> {
		self.with_layer(|layer| layer.deleted = true)
	}
}

/// Annotates every buffer as one `keyword` capture and counts calls.
#[derive(Default)]
pub struct FakeAnnotations {
	calls: Mutex<Vec<LanguageId>>,
}

impl FakeAnnotations {
	pub fn calls(&self) -> usize {
		self.calls.lock().unwrap().len()
	}

	pub fn last_language(&self) -> Option<LanguageId> {
		self.calls.lock().unwrap().last().cloned()
	}
}

#[async_trait]
impl AnnotationSource for FakeAnnotations {
	async fn parse_and_query(&self, language: &LanguageId, source: Arc<[u8]>) -> Vec<Capture> {
		self.calls.lock().unwrap().push(language.clone());
		if source.is_empty() {
			return Vec::new();
		}
		vec![Capture::new("keyword", 0..source.len())]
	}

	fn languages(&self) -> Vec<LanguageId> {
		vec![LanguageId::from("rust"), LanguageId::from("python")]
	}
}
