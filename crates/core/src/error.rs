//! Error types, shared with the runtime crate.

pub use wamp_runtime::error::{Error, Result};
