/// Execution classes used to label spawned work in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Long-lived per-window session controllers.
	Session,
	/// Stream readers feeding a session's wait-multiplex point.
	Watcher,
	/// Daemon-level supervision (window discovery, reconnects).
	Control,
	/// CPU-bound parsing executed on the blocking pool.
	CpuBlocking,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Session => "session",
			Self::Watcher => "watcher",
			Self::Control => "control",
			Self::CpuBlocking => "cpu_blocking",
		}
	}
}
