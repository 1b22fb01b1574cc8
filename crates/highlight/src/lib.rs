//! Highlight composition for tinct.
//!
//! Turns parser captures (byte ranges in priority order) into the
//! non-overlapping, character-offset spans an acme-styles layer expects.

mod compose;
mod style;

pub use compose::{Capture, Span, compose, encode_spans};
pub use style::{StyleId, StyleTable, StyleTableError};
