//! Filename handlers and the interpreter table.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::interpreter::{interpreter_base, interpreter_name};

/// Language identifier shared by the resolver and the annotation engine
/// (e.g. `"rust"`, `"python"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageId(Arc<str>);

impl LanguageId {
	pub fn new(id: impl Into<Arc<str>>) -> Self {
		Self(id.into())
	}

	#[inline]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for LanguageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for LanguageId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl From<String> for LanguageId {
	fn from(id: String) -> Self {
		Self::new(id)
	}
}

/// Errors raised while building a resolver.
#[derive(Debug, Error)]
pub enum ResolverError {
	/// A filename handler pattern is not a valid regex.
	#[error("filename handler pattern {pattern:?}: {source}")]
	InvalidPattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},
}

/// Interpreters recognised on `#!` lines, after version stripping.
const INTERPRETERS: &[(&str, &str)] = &[
	("sh", "bash"),
	("bash", "bash"),
	("dash", "bash"),
	("ksh", "bash"),
	("zsh", "bash"),
	("fish", "bash"),
	("python", "python"),
	("node", "javascript"),
	("nodejs", "javascript"),
	("deno", "javascript"),
	("bun", "javascript"),
	("ts-node", "javascript"),
	("java", "java"),
	("jbang", "java"),
	("scala", "scala"),
	("amm", "scala"),
	("rust-script", "rust"),
	("go", "go"),
	("gorun", "go"),
];

#[derive(Debug)]
struct FilenameHandler {
	pattern: Regex,
	language: LanguageId,
}

/// Resolves window names and interpreter lines to registered languages.
#[derive(Debug, Default)]
pub struct LanguageResolver {
	handlers: Vec<FilenameHandler>,
	by_interpreter: FxHashMap<String, LanguageId>,
	registered: FxHashSet<LanguageId>,
}

impl LanguageResolver {
	/// Creates a resolver that only answers with `registered` languages.
	///
	/// The built-in interpreter table is installed; filename handlers are
	/// added with [`Self::add_handler`].
	pub fn new<I>(registered: I) -> Self
	where
		I: IntoIterator<Item = LanguageId>,
	{
		let mut resolver = Self {
			registered: registered.into_iter().collect(),
			..Self::default()
		};
		for (interpreter, language) in INTERPRETERS {
			resolver.register_interpreter(interpreter, LanguageId::from(*language));
		}
		resolver
	}

	/// Appends a filename handler. Handlers are tried in insertion order.
	pub fn add_handler(&mut self, pattern: &str, language: impl Into<LanguageId>) -> Result<(), ResolverError> {
		let regex = Regex::new(pattern).map_err(|source| ResolverError::InvalidPattern {
			pattern: pattern.to_string(),
			source,
		})?;
		let language = language.into();
		if !self.registered.contains(&language) {
			tracing::warn!(%language, pattern, "filename handler names a language without a grammar");
		}
		self.handlers.push(FilenameHandler { pattern: regex, language });
		Ok(())
	}

	/// Maps an interpreter base name (no version suffix) to a language.
	pub fn register_interpreter(&mut self, interpreter: &str, language: LanguageId) {
		self.by_interpreter.insert(interpreter.to_string(), language);
	}

	/// Number of filename handlers.
	pub fn handler_count(&self) -> usize {
		self.handlers.len()
	}

	/// Resolves a window name through the filename handlers.
	///
	/// The first matching handler decides: when it names an unregistered
	/// language the result is `None`, later handlers are not consulted.
	pub fn resolve_by_filename(&self, name: &str) -> Option<LanguageId> {
		let handler = self.handlers.iter().find(|h| h.pattern.is_match(name))?;
		self.registered(&handler.language)
	}

	/// Resolves the first line of a buffer as an interpreter line.
	pub fn resolve_by_interpreter_line(&self, line: &str) -> Option<LanguageId> {
		let interpreter = interpreter_base(interpreter_name(line.trim_end())?);
		let language = self.by_interpreter.get(interpreter)?;
		self.registered(language)
	}

	fn registered(&self, language: &LanguageId) -> Option<LanguageId> {
		self.registered.get(language).cloned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn resolver(registered: &[&str]) -> LanguageResolver {
		LanguageResolver::new(registered.iter().map(|id| LanguageId::from(*id)))
	}

	#[test]
	fn first_matching_handler_decides() {
		let mut resolver = resolver(&["go", "c", "rust"]);
		resolver.add_handler(r"\.go$", "go").unwrap();
		resolver.add_handler(r"\.(c|h)$", "c").unwrap();
		resolver.add_handler(r"\.rs$", "rust").unwrap();
		resolver.add_handler(r".*", "c").unwrap();
		assert_eq!(resolver.handler_count(), 4);

		assert_eq!(resolver.resolve_by_filename("/src/main.go"), Some(LanguageId::from("go")));
		assert_eq!(resolver.resolve_by_filename("/src/lib.rs"), Some(LanguageId::from("rust")));
		assert_eq!(resolver.resolve_by_filename("/src/notes.txt"), Some(LanguageId::from("c")));
	}

	#[test]
	fn handler_for_unregistered_language_yields_none() {
		let mut resolver = resolver(&["rust"]);
		resolver.add_handler(r"\.rb$", "ruby").unwrap();
		resolver.add_handler(r".*", "rust").unwrap();
		assert_eq!(resolver.resolve_by_filename("/x/app.rb"), None);
		assert_eq!(resolver.resolve_by_filename("/x/app.rs"), Some(LanguageId::from("rust")));
	}

	#[test]
	fn no_handlers_means_no_filename_match() {
		let resolver = resolver(&["rust"]);
		assert_eq!(resolver.resolve_by_filename("/x/app.rs"), None);
	}

	#[test]
	fn invalid_pattern_is_reported() {
		let mut resolver = resolver(&["go"]);
		let err = resolver.add_handler(r"\.go(", "go").unwrap_err();
		assert!(matches!(err, ResolverError::InvalidPattern { ref pattern, .. } if pattern == r"\.go("));
	}

	#[test]
	fn interpreter_lines_resolve_through_table() {
		let resolver = resolver(&["bash", "python", "javascript", "java", "scala", "rust", "go"]);
		let cases = [
			("#!/usr/bin/env python3", Some("python")),
			("#!/usr/bin/env python3.11", Some("python")),
			("#!/usr/bin/python2.7\n", Some("python")),
			("#!/usr/bin/env bash", Some("bash")),
			("#!/bin/sh", Some("bash")),
			("#!/bin/zsh", Some("bash")),
			("#!/usr/bin/env scala", Some("scala")),
			("#!/usr/bin/env -S scala", Some("scala")),
			("#!/usr/bin/env -u PYTHONPATH python3", Some("python")),
			("#!/usr/bin/env -C /tmp node", Some("javascript")),
			("#!/usr/bin/env scala3", Some("scala")),
			("#!/usr/bin/env java", Some("java")),
			("#!/usr/bin/env jbang", Some("java")),
			("#!/usr/bin/env node", Some("javascript")),
			("#!/usr/bin/env deno", Some("javascript")),
			("#!/usr/bin/env ts-node", Some("javascript")),
			("#!/usr/bin/env rust-script", Some("rust")),
			("#!/usr/bin/env go run", Some("go")),
			("#!/usr/bin/env ruby", None),
			("#!/usr/bin/perl", None),
			("package main", None),
			("", None),
		];
		for (line, want) in cases {
			assert_eq!(resolver.resolve_by_interpreter_line(line), want.map(LanguageId::from), "{line:?}");
		}
	}

	#[test]
	fn interpreter_for_unregistered_language_yields_none() {
		let resolver = resolver(&["python"]);
		assert_eq!(resolver.resolve_by_interpreter_line("#!/usr/bin/env scala"), None);
		assert_eq!(resolver.resolve_by_interpreter_line("#!/usr/bin/env python3"), Some(LanguageId::from("python")));
	}

	#[test]
	fn custom_interpreters_extend_the_table() {
		let mut resolver = resolver(&["c", "python"]);
		assert_eq!(resolver.resolve_by_interpreter_line("#!/usr/bin/env tcc -run"), None);
		resolver.register_interpreter("tcc", LanguageId::from("c"));
		assert_eq!(resolver.resolve_by_interpreter_line("#!/usr/bin/env tcc -run"), Some(LanguageId::from("c")));

		// Configured entries replace built-in ones.
		resolver.register_interpreter("python", LanguageId::from("c"));
		assert_eq!(resolver.resolve_by_interpreter_line("#!/usr/bin/python3"), Some(LanguageId::from("c")));
	}
}
