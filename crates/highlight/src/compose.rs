//! Capture-to-span composition.
//!
//! Parsers report captures as byte ranges in query-pattern priority order;
//! the compositor wants non-overlapping spans in character offsets.
//! [`compose`] bridges the two in two passes:
//!
//! 1. paint: one [`StyleId`] slot per source byte, filled first-match-wins,
//! 2. sweep: walk the bytes one character unit at a time and emit a span at
//!    every style transition.

use std::fmt::{self, Write as _};
use std::ops::Range;
use std::sync::Arc;

use crate::style::{StyleId, StyleTable};

/// A byte-range annotation produced by a parser query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
	/// Capture name, e.g. `"function.method"`.
	pub kind: Arc<str>,
	/// Half-open byte range into the source the capture was computed from.
	pub bytes: Range<usize>,
}

impl Capture {
	pub fn new(kind: impl Into<Arc<str>>, bytes: Range<usize>) -> Self {
		Self { kind: kind.into(), bytes }
	}
}

/// A styled run in character offsets, `start` inclusive and `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
	pub style: StyleId,
	pub start: usize,
	pub end: usize,
}

impl fmt::Display for Span {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {} {}", self.style.get(), self.start, self.end)
	}
}

/// Encodes spans in the compositor's line format, one `idx start end` line each.
pub fn encode_spans(spans: &[Span]) -> String {
	let mut out = String::with_capacity(spans.len() * 16);
	for span in spans {
		let _ = writeln!(out, "{span}");
	}
	out
}

/// Composes `captures` over `source` into ordered, non-overlapping spans.
///
/// Captures are applied in the order given and never overwrite a byte an
/// earlier capture already styled. Capture kinds are resolved through
/// [`StyleTable::resolve`]; unresolved captures are skipped. Ranges are
/// clamped to `source`.
pub fn compose(captures: &[Capture], source: &[u8], table: &StyleTable) -> Vec<Span> {
	let mut slots = vec![StyleId::UNSTYLED; source.len()];
	for capture in captures {
		let Some(style) = table.resolve(&capture.kind) else {
			continue;
		};
		paint(&mut slots, capture.bytes.clone(), style);
	}
	sweep(&slots, source)
}

fn paint(slots: &mut [StyleId], bytes: Range<usize>, style: StyleId) {
	let end = bytes.end.min(slots.len());
	let start = bytes.start.min(end);
	for slot in &mut slots[start..end] {
		if !slot.is_styled() {
			*slot = style;
		}
	}
}

fn sweep(slots: &[StyleId], source: &[u8]) -> Vec<Span> {
	let mut spans = Vec::new();
	let mut current = StyleId::UNSTYLED;
	let mut span_start = 0;
	let mut chars = 0;
	let mut pos = 0;

	while pos < source.len() {
		let style = slots[pos];
		if style != current {
			if current.is_styled() {
				spans.push(Span {
					style: current,
					start: span_start,
					end: chars,
				});
			}
			current = style;
			span_start = chars;
		}
		pos += unit_width(&source[pos..]);
		chars += 1;
	}

	if current.is_styled() {
		spans.push(Span {
			style: current,
			start: span_start,
			end: chars,
		});
	}
	spans
}

/// Width in bytes of the character unit starting at `rest[0]`.
///
/// Anything that is not a complete, well-formed UTF-8 sequence counts as a
/// single-byte unit, matching how the editor turns bad bytes into one
/// replacement rune each.
fn unit_width(rest: &[u8]) -> usize {
	let width = match rest[0] {
		0xC0..=0xDF => 2,
		0xE0..=0xEF => 3,
		0xF0..=0xF7 => 4,
		_ => return 1,
	};
	match rest.get(1..width) {
		Some(tail) if tail.iter().all(|b| b & 0xC0 == 0x80) => width,
		_ => 1,
	}
}
