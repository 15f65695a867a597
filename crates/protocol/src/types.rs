//! Shared value types and well-known URIs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request identifier scoped to one session.
pub type RequestId = u64;

/// Keyword arguments attached to calls, publications and errors.
pub type Kwargs = Map<String, Value>;

/// Largest identifier a WAMP peer may emit (2^53).
pub const MAX_ID: u64 = 1 << 53;

/// Authentication method name for challenge-response auth.
pub const WAMP_CRA: &str = "wampcra";

/// Well-known close and error URIs.
pub mod uri {
	/// Normal session close initiated by this peer.
	pub const CLOSE_NORMAL: &str = "wamp.close.normal";
	/// Reply to a router-initiated goodbye.
	pub const GOODBYE_AND_OUT: &str = "wamp.close.goodbye_and_out";
	/// Router rejected the credentials.
	pub const NOT_AUTHORIZED: &str = "wamp.error.not_authorized";
	/// Router could not verify the challenge response.
	pub const AUTHENTICATION_FAILED: &str = "wamp.error.authentication_failed";
	/// Realm does not exist on the router.
	pub const NO_SUCH_REALM: &str = "wamp.error.no_such_realm";
}

/// Kind of request that awaits a router reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
	/// RPC call awaiting a `Result`.
	Call,
	/// Acknowledged publication awaiting `Published`.
	Publish,
}

impl std::fmt::Display for RequestKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			RequestKind::Call => f.write_str("call"),
			RequestKind::Publish => f.write_str("publish"),
		}
	}
}

/// Result of a remote procedure call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
	/// Positional results.
	#[serde(default)]
	pub args: Vec<Value>,
	/// Keyword results.
	#[serde(default)]
	pub kwargs: Kwargs,
}

impl CallResult {
	/// Creates a result from positional values only.
	pub fn from_args(args: Vec<Value>) -> Self {
		Self {
			args,
			kwargs: Kwargs::new(),
		}
	}

	/// Returns the first positional result, which most procedures use as
	/// their single return value.
	pub fn first(&self) -> Option<&Value> {
		self.args.first()
	}

	/// Returns `true` when the procedure returned nothing.
	pub fn is_empty(&self) -> bool {
		self.args.is_empty() && self.kwargs.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn call_result_first_and_empty() {
		let result = CallResult::from_args(vec![serde_json::json!(5)]);
		assert_eq!(result.first(), Some(&serde_json::json!(5)));
		assert!(!result.is_empty());
		assert!(CallResult::default().is_empty());
	}

	#[test]
	fn call_result_defaults_missing_fields() {
		let result: CallResult = serde_json::from_str(r#"{"args": [1]}"#).unwrap();
		assert_eq!(result.args, vec![serde_json::json!(1)]);
		assert!(result.kwargs.is_empty());
	}
}
