//! Live highlighting sessions for acme windows.
//!
//! # Mental model
//!
//! * [`Daemon`] discovers windows through a [`WindowSource`] and starts one
//!   session per window via [`SessionContext::start`]. Starts are idempotent:
//!   a window already under a session is skipped.
//! * A session ([`run_session`]) owns one compositor [`Layer`] through a
//!   [`StyleLayer`]. It highlights the whole body, then re-highlights after
//!   every debounced edit burst.
//! * Every failure is retried with full-jitter backoff until the window
//!   closes or the daemon is cancelled.
//!
//! # Cleanup
//!
//! | exit              | layer                  |
//! |-------------------|------------------------|
//! | window closed     | cleared, kept          |
//! | error (retrying)  | deleted, re-acquired   |
//! | cancelled         | deleted                |
//!
//! Collaborators are trait objects so the transport, compositor and parser
//! can be swapped out in tests.

mod context;
mod daemon;
mod debounce;
mod layer;
mod session;
mod source;
#[cfg(test)]
mod test_helpers;

pub use context::{DEFAULT_LAYER_NAME, Services, SessionContext, SessionSettings};
pub use daemon::Daemon;
pub use debounce::Debouncer;
pub use layer::{Compositor, CompositorError, Layer, StyleLayer};
pub use session::{SessionError, run_session};
pub use source::{
	AnnotationSource, EditKind, EditStream, TransportError, WindowEvents, WindowHandle, WindowId, WindowInfo, WindowSource,
};
