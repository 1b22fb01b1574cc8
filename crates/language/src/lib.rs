//! Language resolution for tinct.
//!
//! A window is matched to a language in two steps: the configured filename
//! handlers are tried against the window name, and failing that the
//! window's first line is read as an interpreter line (`#!/usr/bin/env
//! python3`). Either step only yields languages the annotation engine has
//! registered.

mod config;
mod interpreter;

pub use config::{LanguageId, LanguageResolver, ResolverError};
pub use interpreter::{interpreter_base, interpreter_name};
