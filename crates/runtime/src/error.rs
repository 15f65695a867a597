//! Error types for the WAMP runtime.

use serde_json::Value;
use thiserror::Error;
use wamp_protocol::{Kwargs, uri};

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while establishing or using a client session.
#[derive(Debug, Error)]
pub enum Error {
	/// Missing or invalid realm, host or port.
	#[error("Invalid configuration: {0}")]
	Configuration(String),

	/// The transport could not be opened.
	#[error("Failed to connect to {endpoint}: {reason}")]
	ConnectionFailed { endpoint: String, reason: String },

	/// The transport failed or dropped mid-flight.
	#[error("Transport error: {0}")]
	Transport(String),

	/// The client could not answer an authentication challenge.
	#[error("Authentication failed: {0}")]
	Authentication(String),

	/// The router aborted the session.
	#[error("Session aborted by router: {reason}{}", message.as_ref().map(|m| format!(" ({m})")).unwrap_or_default())]
	Aborted { reason: String, message: Option<String> },

	/// Unexpected message for the current session state.
	#[error("Protocol error: {0}")]
	Protocol(String),

	/// The remote peer reported a procedure or publish failure.
	#[error("{uri}{}", args.first().map(|a| format!(": {a}")).unwrap_or_default())]
	Remote {
		/// Error URI (e.g. `wamp.error.no_such_procedure`)
		uri: String,
		/// Positional error payload
		args: Vec<Value>,
		/// Keyword error payload
		kwargs: Kwargs,
	},

	/// Input could not be canonicalized or was otherwise unusable.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// The session is closed; no further requests may be issued on it.
	#[error("Session closed: {0}")]
	SessionClosed(String),

	/// Channel closed unexpectedly.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// Timeout waiting for an operation.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// No async runtime to drive the operation.
	#[error("No async runtime available: {0}")]
	Runtime(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns the error URI if this is a Remote error.
	pub fn remote_uri(&self) -> Option<&str> {
		match self {
			Error::Remote { uri, .. } => Some(uri),
			_ => None,
		}
	}

	/// Returns true if the remote peer reported this error.
	pub fn is_remote(&self) -> bool {
		matches!(self, Error::Remote { .. })
	}

	/// Returns true if this error came from the connection rather than the peer.
	pub fn is_transport(&self) -> bool {
		matches!(
			self,
			Error::ConnectionFailed { .. } | Error::Transport(_) | Error::SessionClosed(_) | Error::ChannelClosed | Error::Io(_)
		)
	}

	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		match self {
			Error::Timeout(_) => true,
			Error::Remote { uri, .. } => uri == "wamp.error.canceled" || uri.ends_with(".timeout"),
			_ => false,
		}
	}

	/// Returns true if the session could not be authenticated.
	pub fn is_authentication(&self) -> bool {
		match self {
			Error::Authentication(_) => true,
			Error::Aborted { reason, .. } => reason == uri::NOT_AUTHORIZED || reason == uri::AUTHENTICATION_FAILED,
			_ => false,
		}
	}
}
