//! One compiled grammar and its highlight query.

use std::sync::Arc;

use streaming_iterator::StreamingIterator;
use tinct_highlight::Capture;
use tinct_language::LanguageId;
use tree_sitter::{Language, Parser, Query, QueryCursor};

/// A tree-sitter language plus its compiled highlight query, if any.
pub struct Grammar {
	id: LanguageId,
	language: Language,
	query: Option<HighlightQuery>,
}

struct HighlightQuery {
	query: Query,
	/// Capture names interned once, indexed like `query.capture_names()`.
	kinds: Vec<Arc<str>>,
}

impl Grammar {
	/// Compiles `highlights` for `language`.
	///
	/// A query that fails to compile is logged and leaves the grammar
	/// without a query; parsing such a language yields no captures.
	pub fn new(id: LanguageId, language: Language, highlights: &str) -> Self {
		let query = match Query::new(&language, highlights) {
			Ok(query) => {
				let kinds = query.capture_names().iter().map(|name| Arc::<str>::from(*name)).collect();
				Some(HighlightQuery { query, kinds })
			}
			Err(error) => {
				tracing::error!(language = %id, %error, "highlight query failed to compile");
				None
			}
		};
		Self { id, language, query }
	}

	pub fn id(&self) -> &LanguageId {
		&self.id
	}

	pub fn language(&self) -> &Language {
		&self.language
	}

	pub fn has_query(&self) -> bool {
		self.query.is_some()
	}

	/// Parses `source` and runs the highlight query over the whole tree.
	///
	/// Captures come back in pattern order: every capture of an earlier
	/// pattern precedes every capture of a later one, and captures of the
	/// same pattern keep document order.
	pub fn captures(&self, source: &[u8]) -> Vec<Capture> {
		let Some(highlights) = &self.query else {
			return Vec::new();
		};

		let mut parser = Parser::new();
		if let Err(error) = parser.set_language(&self.language) {
			tracing::error!(language = %self.id, %error, "grammar rejected by parser");
			return Vec::new();
		}
		let Some(tree) = parser.parse(source, None) else {
			tracing::warn!(language = %self.id, bytes = source.len(), "parse produced no tree");
			return Vec::new();
		};

		let mut cursor = QueryCursor::new();
		let mut ranked = Vec::new();
		let mut matches = cursor.captures(&highlights.query, tree.root_node(), source);
		while let Some((query_match, capture_idx)) = matches.next() {
			let capture = query_match.captures[*capture_idx];
			let kind = &highlights.kinds[capture.index as usize];
			if kind.starts_with('_') {
				continue;
			}
			ranked.push((
				query_match.pattern_index,
				Capture {
					kind: Arc::clone(kind),
					bytes: capture.node.byte_range(),
				},
			));
		}

		ranked.sort_by_key(|(pattern, _)| *pattern);
		ranked.into_iter().map(|(_, capture)| capture).collect()
	}
}
