//! acme transport for tinct.
//!
//! Both services are plain file trees: acme's (`index`, `log`, `{id}/body`,
//! `{id}/log`) and acme-styles' (`{win}/layers/new`, `{win}/layers/{id}/…`).
//! They are reached through their mount points, e.g. plan9port's `9pfuse`
//! or a native 9P mount.

mod protocol;
mod styles;
mod windows;

pub use styles::{AcmeStyles, DEFAULT_STYLES_ROOT};
pub use windows::{AcmeWindows, DEFAULT_ACME_ROOT};
