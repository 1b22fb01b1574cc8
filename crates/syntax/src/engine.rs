//! Grammar registry and the async annotation entry point.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tinct_highlight::Capture;
use tinct_language::LanguageId;
use tinct_session::AnnotationSource;
use tinct_worker::TaskClass;
use tree_sitter::Language;

use crate::grammar::Grammar;

/// Highlight query file looked up under a language's override directory.
const HIGHLIGHTS_FILE: &str = "highlights.scm";

/// Languages compiled into the binary with their bundled highlight queries.
fn bundled() -> Vec<(&'static str, Language, &'static str)> {
	vec![
		("bash", tree_sitter_bash::LANGUAGE.into(), tree_sitter_bash::HIGHLIGHT_QUERY),
		("c", tree_sitter_c::LANGUAGE.into(), tree_sitter_c::HIGHLIGHT_QUERY),
		("cpp", tree_sitter_cpp::LANGUAGE.into(), tree_sitter_cpp::HIGHLIGHT_QUERY),
		("go", tree_sitter_go::LANGUAGE.into(), tree_sitter_go::HIGHLIGHTS_QUERY),
		("java", tree_sitter_java::LANGUAGE.into(), tree_sitter_java::HIGHLIGHTS_QUERY),
		("javascript", tree_sitter_javascript::LANGUAGE.into(), tree_sitter_javascript::HIGHLIGHT_QUERY),
		("python", tree_sitter_python::LANGUAGE.into(), tree_sitter_python::HIGHLIGHTS_QUERY),
		("rust", tree_sitter_rust::LANGUAGE.into(), tree_sitter_rust::HIGHLIGHTS_QUERY),
	]
}

/// Registered grammars, keyed by language id. Queries are compiled once at
/// registration and shared by every parse.
#[derive(Default)]
pub struct SyntaxEngine {
	grammars: FxHashMap<LanguageId, Arc<Grammar>>,
}

impl SyntaxEngine {
	/// An engine with no languages.
	pub fn new() -> Self {
		Self::default()
	}

	/// An engine with every bundled language.
	pub fn builtin() -> Self {
		let mut engine = Self::new();
		for (id, language, highlights) in bundled() {
			engine.register(id, language, highlights);
		}
		tracing::debug!(languages = engine.grammars.len(), "syntax engine ready");
		engine
	}

	/// Registers (or replaces) a language.
	pub fn register(&mut self, id: impl Into<LanguageId>, language: Language, highlights: &str) {
		let id = id.into();
		let grammar = Grammar::new(id.clone(), language, highlights);
		self.grammars.insert(id, Arc::new(grammar));
	}

	/// Replaces bundled queries with `{dir}/{language}/highlights.scm` where
	/// such a file exists. Returns the number of overrides applied.
	pub fn load_query_overrides(&mut self, dir: &Path) -> usize {
		let mut applied = 0;
		for grammar in self.grammars.values_mut() {
			let path = dir.join(grammar.id().as_str()).join(HIGHLIGHTS_FILE);
			let text = match std::fs::read_to_string(&path) {
				Ok(text) => text,
				Err(error) if error.kind() == std::io::ErrorKind::NotFound => continue,
				Err(error) => {
					tracing::warn!(path = %path.display(), %error, "cannot read highlight query override");
					continue;
				}
			};
			*grammar = Arc::new(Grammar::new(grammar.id().clone(), grammar.language().clone(), &text));
			tracing::info!(language = %grammar.id(), path = %path.display(), "highlight query overridden");
			applied += 1;
		}
		applied
	}

	/// Returns whether `language` is registered with a working query.
	pub fn has_query(&self, language: &LanguageId) -> bool {
		self.grammars.get(language).is_some_and(|grammar| grammar.has_query())
	}

	/// Parses and queries synchronously on the calling thread.
	pub fn captures(&self, language: &LanguageId, source: &[u8]) -> Vec<Capture> {
		match self.grammars.get(language) {
			Some(grammar) => grammar.captures(source),
			None => Vec::new(),
		}
	}
}

#[async_trait]
impl AnnotationSource for SyntaxEngine {
	async fn parse_and_query(&self, language: &LanguageId, source: Arc<[u8]>) -> Vec<Capture> {
		let Some(grammar) = self.grammars.get(language).filter(|grammar| grammar.has_query()).cloned() else {
			return Vec::new();
		};
		match tinct_worker::spawn_blocking(TaskClass::CpuBlocking, move || grammar.captures(&source)).await {
			Ok(captures) => captures,
			Err(error) => {
				tracing::error!(%language, %error, "parse task failed");
				Vec::new()
			}
		}
	}

	fn languages(&self) -> Vec<LanguageId> {
		let mut languages: Vec<LanguageId> = self.grammars.keys().cloned().collect();
		languages.sort();
		languages
	}
}
