//! Sessions opened for a single operation.
//!
//! An ephemeral client makes exactly one connection attempt, runs one
//! operation on the resulting session and closes it again. The connection
//! is closed on every exit path: success, remote error, refused handshake,
//! and timeout.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use wamp_runtime::{ClientSession, Endpoint, SessionConfig, TransportProvider};

use crate::error::{Error, Result};

/// Lifecycle of an ephemeral client.
///
/// `Created → Connecting → Open → InFlight → Closed`, with `Error`
/// reachable from `Connecting`, `Open` and `InFlight`. Both `Closed` and
/// `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EphemeralState {
	Created,
	Connecting,
	Open,
	InFlight,
	Closed,
	Error,
}

impl EphemeralState {
	pub fn is_terminal(self) -> bool {
		matches!(self, EphemeralState::Closed | EphemeralState::Error)
	}

	fn can_advance_to(self, next: EphemeralState) -> bool {
		matches!(
			(self, next),
			(EphemeralState::Created, EphemeralState::Connecting)
				| (EphemeralState::Connecting, EphemeralState::Open)
				| (EphemeralState::Open, EphemeralState::InFlight)
				| (EphemeralState::InFlight, EphemeralState::Closed)
				| (
					EphemeralState::Connecting | EphemeralState::Open | EphemeralState::InFlight,
					EphemeralState::Error
				)
		)
	}
}

impl fmt::Display for EphemeralState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			EphemeralState::Created => "created",
			EphemeralState::Connecting => "connecting",
			EphemeralState::Open => "open",
			EphemeralState::InFlight => "in_flight",
			EphemeralState::Closed => "closed",
			EphemeralState::Error => "error",
		};
		f.write_str(name)
	}
}

/// One-shot client: connect, handshake, run one operation, close.
pub(crate) struct EphemeralClient<'a> {
	transports: &'a dyn TransportProvider,
	endpoint: Endpoint,
	config: SessionConfig,
	timeout: Option<Duration>,
	state: EphemeralState,
}

impl<'a> EphemeralClient<'a> {
	pub(crate) fn new(
		transports: &'a dyn TransportProvider,
		endpoint: Endpoint,
		config: SessionConfig,
		timeout: Option<Duration>,
	) -> Self {
		Self {
			transports,
			endpoint,
			config,
			timeout,
			state: EphemeralState::Created,
		}
	}

	#[cfg(test)]
	pub(crate) fn state(&self) -> EphemeralState {
		self.state
	}

	fn advance(&mut self, next: EphemeralState) {
		debug_assert!(self.state.can_advance_to(next), "invalid transition {} -> {next}", self.state);
		tracing::trace!(target = "wamp.ephemeral", endpoint = %self.endpoint, from = %self.state, to = %next, "state change");
		self.state = next;
	}

	/// Opens a session, runs `op` on it and closes it.
	///
	/// With a timeout configured, connect, handshake and `op` share one
	/// deadline.
	pub(crate) async fn run<T, F, Fut>(&mut self, op: F) -> Result<T>
	where
		F: FnOnce(Arc<ClientSession>) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let deadline = self.timeout.map(|timeout| Instant::now() + timeout);

		self.advance(EphemeralState::Connecting);
		let session = match self.open(deadline).await {
			Ok(session) => session,
			Err(err) => {
				self.advance(EphemeralState::Error);
				return Err(err);
			}
		};
		self.advance(EphemeralState::Open);

		self.advance(EphemeralState::InFlight);
		let outcome = match remaining(deadline) {
			Some(left) => match tokio::time::timeout(left, op(Arc::clone(&session))).await {
				Ok(outcome) => outcome,
				Err(_) => Err(self.timed_out("operation")),
			},
			None => op(Arc::clone(&session)).await,
		};

		if let Err(err) = session.close().await {
			tracing::debug!(target = "wamp.ephemeral", endpoint = %self.endpoint, error = %err, "close failed");
		}

		match outcome {
			Ok(value) => {
				self.advance(EphemeralState::Closed);
				Ok(value)
			}
			Err(err) => {
				self.advance(EphemeralState::Error);
				Err(err)
			}
		}
	}

	async fn open(&self, deadline: Option<Instant>) -> Result<Arc<ClientSession>> {
		tracing::debug!(
			target = "wamp.ephemeral",
			endpoint = %self.endpoint,
			authid = self.config.authid().unwrap_or("anonymous"),
			"opening ephemeral session"
		);

		let connect = self.transports.connect(&self.endpoint);
		let connected = match remaining(deadline) {
			Some(left) => tokio::time::timeout(left, connect)
				.await
				.map_err(|_| self.timed_out("connect"))?,
			None => connect.await,
		};
		let parts = connected.map_err(|err| self.connection_failed(err))?;

		let config = match remaining(deadline) {
			Some(left) => self.config.clone().with_handshake_timeout(left),
			None => self.config.clone(),
		};
		ClientSession::establish(parts, &config).await
	}

	fn connection_failed(&self, err: Error) -> Error {
		match err {
			Error::ConnectionFailed { .. } | Error::Timeout(_) => err,
			other => Error::ConnectionFailed {
				endpoint: self.endpoint.url(),
				reason: other.to_string(),
			},
		}
	}

	fn timed_out(&self, phase: &str) -> Error {
		let budget = self.timeout.map(|t| t.as_millis()).unwrap_or_default();
		Error::Timeout(format!("{phase} on {} exceeded {budget}ms", self.endpoint.url()))
	}
}

fn remaining(deadline: Option<Instant>) -> Option<Duration> {
	deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()))
}
