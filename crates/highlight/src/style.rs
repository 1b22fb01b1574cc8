//! Canonical style table.
//!
//! The table is an ordered list of kind names; a name's position is the
//! style index written to the compositor. Index 0 is the unstyled sentinel
//! and is never produced by [`StyleTable::resolve`].

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Index into a [`StyleTable`]. `0` means unstyled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StyleId(u8);

impl StyleId {
	/// The unstyled sentinel.
	pub const UNSTYLED: StyleId = StyleId(0);

	/// Raw index value.
	#[inline]
	pub const fn get(self) -> u8 {
		self.0
	}

	/// Returns `true` for every index except the sentinel.
	#[inline]
	pub const fn is_styled(self) -> bool {
		self.0 != 0
	}
}

/// Errors raised while building a style table.
#[derive(Debug, Error)]
pub enum StyleTableError {
	/// The style file could not be read.
	#[error("reading style file {path}: {error}")]
	Io {
		/// Path of the style file.
		path: PathBuf,
		/// Underlying I/O error.
		error: std::io::Error,
	},

	/// More kinds than a [`StyleId`] can index.
	#[error("style table has {0} entries; at most 256 are supported")]
	TooManyEntries(usize),
}

/// Ordered kind names with hierarchical lookup.
#[derive(Debug, Clone)]
pub struct StyleTable {
	names: Vec<String>,
	by_name: FxHashMap<String, StyleId>,
}

impl StyleTable {
	/// Kinds used when no style file is configured. The first entry is the
	/// unstyled sentinel.
	pub const BUILTIN_KINDS: &'static [&'static str] = &[
		"default",
		"comment",
		"string",
		"keyword",
		"type",
		"function",
		"constant",
		"number",
		"operator",
		"variable",
		"property",
		"punctuation",
	];

	/// Builds the built-in table.
	pub fn builtin() -> Self {
		Self::build(Self::BUILTIN_KINDS.iter().map(|name| name.to_string()).collect())
	}

	/// Builds a table from names in index order.
	///
	/// A repeated name maps to its last position.
	pub fn from_names<I, S>(names: I) -> Result<Self, StyleTableError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let names: Vec<String> = names.into_iter().map(Into::into).collect();
		if names.len() > usize::from(u8::MAX) + 1 {
			return Err(StyleTableError::TooManyEntries(names.len()));
		}
		Ok(Self::build(names))
	}

	fn build(names: Vec<String>) -> Self {
		let by_name = names
			.iter()
			.enumerate()
			.filter_map(|(idx, name)| u8::try_from(idx).ok().map(|idx| (name.clone(), StyleId(idx))))
			.collect();
		Self { names, by_name }
	}

	/// Parses the acme styles file format.
	///
	/// Blank lines and `#` comments are skipped; the first field of every
	/// other line is a kind name. Remaining fields (colours, flags) belong to
	/// the compositor and are ignored.
	pub fn parse(text: &str) -> Result<Self, StyleTableError> {
		Self::from_names(
			text.lines()
				.map(str::trim)
				.filter(|line| !line.is_empty() && !line.starts_with('#'))
				.filter_map(|line| line.split_whitespace().next()),
		)
	}

	/// Reads and parses a style file.
	pub fn load(path: &Path) -> Result<Self, StyleTableError> {
		let text = std::fs::read_to_string(path).map_err(|error| StyleTableError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let table = Self::parse(&text)?;
		tracing::debug!(path = %path.display(), entries = table.len(), "style table loaded");
		Ok(table)
	}

	/// Number of entries, including the sentinel.
	pub fn len(&self) -> usize {
		self.names.len()
	}

	/// Returns `true` if the table has no entries.
	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	/// Name stored at `id`.
	pub fn name(&self, id: StyleId) -> Option<&str> {
		self.names.get(usize::from(id.get())).map(String::as_str)
	}

	/// Resolves a capture name to a style.
	///
	/// `"function.method.call"` is tried as is, then as `"function.method"`,
	/// then `"function"`. A leading `@` is ignored. Names that only resolve
	/// to the sentinel, or not at all, yield `None`.
	pub fn resolve(&self, capture: &str) -> Option<StyleId> {
		let mut name = capture.strip_prefix('@').unwrap_or(capture);
		loop {
			if let Some(&id) = self.by_name.get(name) {
				return id.is_styled().then_some(id);
			}
			let (parent, _) = name.rsplit_once('.')?;
			name = parent;
		}
	}
}

impl Default for StyleTable {
	fn default() -> Self {
		Self::builtin()
	}
}
