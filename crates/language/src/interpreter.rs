//! Interpreter-line parsing.

/// Extracts the interpreter named by a `#!` line.
///
/// `#!/bin/sh` yields `sh`. An `env` indirection is followed past its
/// flags and variable assignments, including the value word of `-u` and
/// `-C`, so `#!/usr/bin/env -u HOME -S scala -cp lib` yields `scala`. Returns `None` for lines that are not interpreter lines
/// or name nothing.
pub fn interpreter_name(line: &str) -> Option<&str> {
	let rest = line.strip_prefix("#!")?;
	let mut words = rest.split_whitespace();
	let program = words.next()?;
	let program = program.rsplit('/').next().unwrap_or(program);
	if program != "env" {
		return (!program.is_empty()).then_some(program);
	}
	while let Some(word) = words.next() {
		if ENV_FLAGS_WITH_ARG.contains(&word) {
			words.next();
		} else if !word.starts_with('-') && !word.contains('=') {
			return Some(word);
		}
	}
	None
}

/// `env` options whose value is a separate word.
const ENV_FLAGS_WITH_ARG: &[&str] = &["-u", "--unset", "-C", "--chdir"];

/// Strips a trailing version suffix: `python3.11` becomes `python`.
pub fn interpreter_base(interpreter: &str) -> &str {
	interpreter.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.')
}
