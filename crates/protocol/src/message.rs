//! Session messages exchanged with a WAMP router.
//!
//! A client session only ever plays the caller and publisher roles, so only
//! the messages those roles need are modeled:
//!
//! 1. Client sends [`ClientMessage::Hello`] naming the realm and auth methods
//! 2. Router answers [`RouterMessage::Challenge`], [`RouterMessage::Welcome`]
//!    or [`RouterMessage::Abort`]
//! 3. Client issues [`ClientMessage::Call`] / [`ClientMessage::Publish`]
//! 4. Router replies [`RouterMessage::Result`], [`RouterMessage::Published`]
//!    or [`RouterMessage::Error`] carrying the same request id
//! 5. Either side ends the session with `Goodbye`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::options::{CallOptions, PublishOptions};
use crate::types::{Kwargs, RequestId, RequestKind};

/// Message sent from the client to the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
	/// Opens a session on a realm.
	Hello {
		/// Realm to join.
		realm: String,
		/// Roles, identity and auth methods offered.
		details: HelloDetails,
	},
	/// Answers a router challenge.
	Authenticate {
		/// Signature computed by the authenticator.
		signature: String,
		/// Method-specific extra data.
		#[serde(default)]
		extra: Kwargs,
	},
	/// Invokes a remote procedure.
	Call {
		/// Correlation id echoed by the router.
		request: RequestId,
		/// Call options.
		options: CallOptions,
		/// Procedure URI.
		procedure: String,
		/// Positional arguments.
		args: Vec<Value>,
		/// Keyword arguments.
		kwargs: Kwargs,
	},
	/// Publishes an event to a topic.
	Publish {
		/// Correlation id echoed by the router when acknowledged.
		request: RequestId,
		/// Publish options.
		options: PublishOptions,
		/// Topic URI.
		topic: String,
		/// Positional arguments.
		args: Vec<Value>,
		/// Keyword arguments.
		kwargs: Kwargs,
	},
	/// Ends the session.
	Goodbye {
		/// Close reason URI.
		reason: String,
		/// Close details.
		#[serde(default)]
		details: Kwargs,
	},
}

impl ClientMessage {
	/// Returns the protocol name of this message, for logging.
	pub fn name(&self) -> &'static str {
		match self {
			ClientMessage::Hello { .. } => "hello",
			ClientMessage::Authenticate { .. } => "authenticate",
			ClientMessage::Call { .. } => "call",
			ClientMessage::Publish { .. } => "publish",
			ClientMessage::Goodbye { .. } => "goodbye",
		}
	}
}

/// Message sent from the router to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouterMessage {
	/// Session established.
	Welcome {
		/// Router-assigned session id.
		session: u64,
		/// Router details (authid, authrole, roles).
		#[serde(default)]
		details: Kwargs,
	},
	/// Authentication challenge.
	Challenge {
		/// Auth method being challenged (e.g. `wampcra`).
		auth_method: String,
		/// Challenge payload (`challenge`, optional `salt`, `iterations`, `keylen`).
		#[serde(default)]
		extra: Kwargs,
	},
	/// Session refused or torn down by the router.
	Abort {
		/// Reason URI.
		reason: String,
		/// Abort details, usually with a `message`.
		#[serde(default)]
		details: Kwargs,
	},
	/// Successful call reply.
	Result {
		/// Id of the originating call.
		request: RequestId,
		/// Positional results.
		#[serde(default)]
		args: Vec<Value>,
		/// Keyword results.
		#[serde(default)]
		kwargs: Kwargs,
	},
	/// Publication acknowledgement.
	Published {
		/// Id of the originating publish.
		request: RequestId,
		/// Router-assigned publication id.
		publication: u64,
	},
	/// Failed call or publish.
	Error {
		/// Kind of the originating request.
		request_kind: RequestKind,
		/// Id of the originating request.
		request: RequestId,
		/// Error URI.
		error: String,
		/// Positional error payload.
		#[serde(default)]
		args: Vec<Value>,
		/// Keyword error payload.
		#[serde(default)]
		kwargs: Kwargs,
	},
	/// Router-initiated session end.
	Goodbye {
		/// Close reason URI.
		reason: String,
		/// Close details.
		#[serde(default)]
		details: Kwargs,
	},
}

impl RouterMessage {
	/// Returns the protocol name of this message, for logging.
	pub fn name(&self) -> &'static str {
		match self {
			RouterMessage::Welcome { .. } => "welcome",
			RouterMessage::Challenge { .. } => "challenge",
			RouterMessage::Abort { .. } => "abort",
			RouterMessage::Result { .. } => "result",
			RouterMessage::Published { .. } => "published",
			RouterMessage::Error { .. } => "error",
			RouterMessage::Goodbye { .. } => "goodbye",
		}
	}
}

/// Details sent with [`ClientMessage::Hello`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HelloDetails {
	/// Announced roles and their features.
	pub roles: Map<String, Value>,
	/// Authentication id, absent for anonymous sessions.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authid: Option<String>,
	/// Offered authentication methods, empty for anonymous sessions.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub authmethods: Vec<String>,
}

impl HelloDetails {
	/// Details for a peer acting as caller and publisher.
	pub fn caller_publisher(authid: Option<String>, authmethods: Vec<String>) -> Self {
		let mut roles = Map::new();
		roles.insert("caller".to_string(), Value::Object(Map::new()));
		roles.insert("publisher".to_string(), Value::Object(Map::new()));
		Self {
			roles,
			authid,
			authmethods,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hello_for_anonymous_omits_auth_fields() {
		let hello = ClientMessage::Hello {
			realm: "realm1".to_string(),
			details: HelloDetails::caller_publisher(None, Vec::new()),
		};
		let value = serde_json::to_value(&hello).unwrap();
		assert_eq!(value["type"], "hello");
		assert_eq!(value["realm"], "realm1");
		assert!(value["details"].get("authid").is_none());
		assert!(value["details"].get("authmethods").is_none());
		assert!(value["details"]["roles"].get("caller").is_some());
		assert!(value["details"]["roles"].get("publisher").is_some());
	}

	#[test]
	fn router_error_deserializes() {
		let json = r#"{"type": "error", "request_kind": "call", "request": 7, "error": "wamp.error.no_such_procedure"}"#;
		let message: RouterMessage = serde_json::from_str(json).unwrap();
		match message {
			RouterMessage::Error {
				request_kind,
				request,
				error,
				args,
				kwargs,
			} => {
				assert_eq!(request_kind, RequestKind::Call);
				assert_eq!(request, 7);
				assert_eq!(error, "wamp.error.no_such_procedure");
				assert!(args.is_empty());
				assert!(kwargs.is_empty());
			}
			other => panic!("Expected Error, got {other:?}"),
		}
	}

	#[test]
	fn challenge_keeps_extra() {
		let json = r#"{"type": "challenge", "auth_method": "wampcra", "extra": {"challenge": "abc", "salt": "s"}}"#;
		let message: RouterMessage = serde_json::from_str(json).unwrap();
		assert_eq!(message.name(), "challenge");
		if let RouterMessage::Challenge { auth_method, extra } = message {
			assert_eq!(auth_method, "wampcra");
			assert_eq!(extra["salt"], "s");
		}
	}
}
