//! Tree-sitter annotation source.
//!
//! [`SyntaxEngine`] owns one [`Grammar`] per language: the tree-sitter
//! language and its highlight query, compiled once. Each request parses the
//! whole buffer from scratch on the blocking pool with a fresh parser and
//! query cursor, so requests for different windows never share mutable
//! state.

mod engine;
mod grammar;

pub use engine::SyntaxEngine;
pub use grammar::Grammar;
