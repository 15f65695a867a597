//! Argument canonicalization.
//!
//! Arguments pass through a serialize → encode → decode cycle before any
//! session sees them, so the values sent are exactly what the wire codec
//! can represent. Positional arguments are then coerced into a list and
//! keyword arguments into an object.

use serde::Serialize;
use serde_json::Value;
use wamp_protocol::Kwargs;

use crate::error::{Error, Result};

/// Wire codec used to canonicalize arguments.
pub trait Codec: Send + Sync {
	fn encode(&self, value: &Value) -> Result<Vec<u8>>;

	fn decode(&self, bytes: &[u8]) -> Result<Value>;
}

/// JSON codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
	fn encode(&self, value: &Value) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec(value)?)
	}

	fn decode(&self, bytes: &[u8]) -> Result<Value> {
		Ok(serde_json::from_slice(bytes)?)
	}
}

/// Canonical positional and keyword arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
	pub args: Vec<Value>,
	pub kwargs: Kwargs,
}

impl Payload {
	/// Canonicalizes `args` and `kwargs` through `codec`.
	pub fn canonical<A, K>(codec: &dyn Codec, args: &A, kwargs: &K) -> Result<Self>
	where
		A: Serialize + ?Sized,
		K: Serialize + ?Sized,
	{
		Ok(Self {
			args: into_args(canonicalize(codec, args)?),
			kwargs: into_kwargs(canonicalize(codec, kwargs)?)?,
		})
	}
}

/// Runs `value` through serialize → encode → decode.
pub fn canonicalize<T: Serialize + ?Sized>(codec: &dyn Codec, value: &T) -> Result<Value> {
	let value = serde_json::to_value(value).map_err(|e| Error::InvalidArgument(format!("cannot serialize argument: {e}")))?;
	let bytes = codec.encode(&value)?;
	codec.decode(&bytes)
}

/// `null` becomes an empty list, a list stays as is, anything else is
/// wrapped in a one-element list.
pub fn into_args(value: Value) -> Vec<Value> {
	match value {
		Value::Null => Vec::new(),
		Value::Array(items) => items,
		other => vec![other],
	}
}

/// `null` becomes an empty object, an object stays as is, anything else is
/// rejected.
pub fn into_kwargs(value: Value) -> Result<Kwargs> {
	match value {
		Value::Null => Ok(Kwargs::new()),
		Value::Object(map) => Ok(map),
		other => Err(Error::InvalidArgument(format!("keyword arguments must be an object, got {other}"))),
	}
}
