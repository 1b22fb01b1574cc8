//! Shared task primitives for the tinct daemon.
//!
//! * [`TaskClass`] and the [`spawn`]/[`spawn_blocking`] helpers label every
//!   spawned task in traces.
//! * [`Backoff`] and [`sleep_or_cancel`] implement the cancellable full-jitter
//!   retry wait used by sessions and by the window-discovery loop.
//! * [`ClaimSet`] is the exclusive-access registry that makes session starts
//!   idempotent per window.

mod backoff;
mod class;
mod registry;
mod spawn;

pub use backoff::{Backoff, sleep_or_cancel};
pub use class::TaskClass;
pub use registry::{Claim, ClaimSet};
pub use spawn::{spawn, spawn_blocking};
