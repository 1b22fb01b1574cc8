//! Line formats of the acme control files.

use tinct_session::{EditKind, TransportError, WindowId, WindowInfo};

/// Parses one `index` line: five numeric columns, then the window tag.
///
/// The window name is the first word of the tag; scratch windows with an
/// empty tag get an empty name.
pub(crate) fn parse_index_line(line: &str) -> Result<WindowInfo, TransportError> {
	let mut fields = line.split_whitespace();
	let id = parse_id(fields.next(), "index line", line)?;
	let name = fields.nth(4).unwrap_or_default();
	Ok(WindowInfo {
		id,
		name: name.to_string(),
	})
}

/// Parses one global `log` line, `{id} {op} {name}`.
///
/// Returns the window for `new` events and `None` for every other op.
pub(crate) fn parse_log_line(line: &str) -> Result<Option<WindowInfo>, TransportError> {
	let mut fields = line.splitn(3, ' ');
	let id = parse_id(fields.next(), "log line", line)?;
	let Some(op) = fields.next() else {
		return Err(malformed("log line", line));
	};
	if op != "new" {
		return Ok(None);
	}
	let name = fields.next().map(str::trim).unwrap_or_default();
	Ok(Some(WindowInfo {
		id,
		name: name.to_string(),
	}))
}

/// Classifies one per-window `log` line. Only body inserts and deletes count.
pub(crate) fn parse_edit_line(line: &str) -> Option<EditKind> {
	match line.as_bytes().first() {
		Some(b'I') => Some(EditKind::Insert),
		Some(b'D') => Some(EditKind::Delete),
		_ => None,
	}
}

fn parse_id(field: Option<&str>, what: &'static str, line: &str) -> Result<WindowId, TransportError> {
	field
		.and_then(|field| field.trim().parse().ok())
		.map(WindowId)
		.ok_or_else(|| malformed(what, line))
}

fn malformed(what: &'static str, line: &str) -> TransportError {
	TransportError::Protocol {
		what,
		line: line.to_string(),
	}
}
