//! Option structs for publish and call requests.
//!
//! Recognized options are typed; anything else a router understands can be
//! passed through `extra`, which is flattened into the same map on the wire.
//! Typed keys never live in `extra`: `with` routes them to their field and
//! the typed setters drop any stale passthrough entry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Kwargs;

const ACKNOWLEDGE: &str = "acknowledge";
const EXCLUDE_ME: &str = "exclude_me";
const TIMEOUT: &str = "timeout";
const DISCLOSE_ME: &str = "disclose_me";

/// Options for a publication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishOptions {
	/// Ask the router to confirm receipt with a `Published` message.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub acknowledge: Option<bool>,

	/// Whether the publisher should also receive its own event.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exclude_me: Option<bool>,

	/// Router-specific options passed through untouched.
	#[serde(flatten)]
	pub extra: Kwargs,
}

impl PublishOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the acknowledge flag.
	pub fn acknowledge(mut self, acknowledge: bool) -> Self {
		self.extra.remove(ACKNOWLEDGE);
		self.acknowledge = Some(acknowledge);
		self
	}

	/// Sets the exclude_me flag.
	pub fn exclude_me(mut self, exclude_me: bool) -> Self {
		self.extra.remove(EXCLUDE_ME);
		self.exclude_me = Some(exclude_me);
		self
	}

	/// Adds a pass-through option. `acknowledge` and `exclude_me` set the
	/// typed fields instead; a non-boolean value clears them.
	pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
		let key = key.into();
		match key.as_str() {
			ACKNOWLEDGE => {
				self.extra.remove(ACKNOWLEDGE);
				self.acknowledge = value.as_bool();
			}
			EXCLUDE_ME => {
				self.extra.remove(EXCLUDE_ME);
				self.exclude_me = value.as_bool();
			}
			_ => {
				self.extra.insert(key, value);
			}
		}
		self
	}

	/// Returns `true` when the router is asked to acknowledge.
	pub fn is_acknowledged(&self) -> bool {
		self.acknowledge.unwrap_or(false)
	}
}

/// Options for a remote procedure call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallOptions {
	/// Router-side call timeout in milliseconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timeout: Option<u64>,

	/// Ask the router to disclose the caller's identity to the callee.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub disclose_me: Option<bool>,

	/// Router-specific options passed through untouched.
	#[serde(flatten)]
	pub extra: Kwargs,
}

impl CallOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the router-side timeout.
	pub fn timeout(mut self, timeout_ms: u64) -> Self {
		self.extra.remove(TIMEOUT);
		self.timeout = Some(timeout_ms);
		self
	}

	/// Sets the disclose_me flag.
	pub fn disclose_me(mut self, disclose: bool) -> Self {
		self.extra.remove(DISCLOSE_ME);
		self.disclose_me = Some(disclose);
		self
	}

	/// Adds a pass-through option. `timeout` and `disclose_me` set the typed
	/// fields instead.
	pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
		let key = key.into();
		match key.as_str() {
			TIMEOUT => {
				self.extra.remove(TIMEOUT);
				self.timeout = value.as_u64();
			}
			DISCLOSE_ME => {
				self.extra.remove(DISCLOSE_ME);
				self.disclose_me = value.as_bool();
			}
			_ => {
				self.extra.insert(key, value);
			}
		}
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn publish_options_flatten_extra() {
		let options = PublishOptions::new().acknowledge(true).with("eligible", serde_json::json!([42]));
		let value = serde_json::to_value(&options).unwrap();
		assert_eq!(value, serde_json::json!({"acknowledge": true, "eligible": [42]}));
	}

	#[test]
	fn publish_options_default_is_unacknowledged() {
		assert!(!PublishOptions::default().is_acknowledged());
		assert!(PublishOptions::new().acknowledge(true).is_acknowledged());
	}

	#[test]
	fn typed_keys_never_pass_through() {
		let options = PublishOptions::new().with("acknowledge", serde_json::json!(false)).acknowledge(true);
		assert!(options.extra.is_empty());
		assert_eq!(serde_json::to_value(&options).unwrap(), serde_json::json!({"acknowledge": true}));

		let options = PublishOptions::new().with("exclude_me", serde_json::json!(false));
		assert_eq!(options.exclude_me, Some(false));
		assert!(options.extra.is_empty());

		let options = CallOptions::new().with("timeout", serde_json::json!(250)).with("disclose_me", serde_json::json!(true));
		assert_eq!(options.timeout, Some(250));
		assert_eq!(options.disclose_me, Some(true));
		assert_eq!(serde_json::to_value(&options).unwrap(), serde_json::json!({"timeout": 250, "disclose_me": true}));
	}

	#[test]
	fn typed_setter_drops_stale_extra_entry() {
		let mut options = PublishOptions::new();
		options.extra.insert("acknowledge".to_string(), serde_json::json!(false));
		let options = options.acknowledge(true);
		assert_eq!(serde_json::to_value(&options).unwrap(), serde_json::json!({"acknowledge": true}));
	}

	#[test]
	fn unknown_keys_land_in_extra() {
		let options: CallOptions = serde_json::from_str(r#"{"timeout": 500, "receive_progress": true}"#).unwrap();
		assert_eq!(options.timeout, Some(500));
		assert_eq!(options.extra.get("receive_progress"), Some(&serde_json::json!(true)));
	}
}
