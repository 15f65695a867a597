//! Sink for failures of operations whose caller may not be listening.

/// Receives one line per failed ephemeral operation.
pub trait ErrorLog: Send + Sync {
	fn log_error(&self, message: &str);
}

/// Writes through `tracing::error!` with target `wamp.client`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorLog;

impl ErrorLog for TracingErrorLog {
	fn log_error(&self, message: &str) {
		tracing::error!(target: "wamp.client", "{message}");
	}
}

impl<F> ErrorLog for F
where
	F: Fn(&str) + Send + Sync,
{
	fn log_error(&self, message: &str) {
		self(message)
	}
}
