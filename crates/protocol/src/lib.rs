//! Typed messages for the WAMP client session layer.
//!
//! This crate contains the serde-serializable shapes exchanged between a
//! client session and the transport that carries it. Encoding these messages
//! into WAMP wire frames is the transport's job, not this crate's.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization and small accessors
//! - **Session-level**: One variant per message a caller or publisher peer
//!   sends or receives
//! - **Stable**: Changes only when the session contract changes

pub mod message;
pub mod options;
pub mod types;

pub use message::*;
pub use options::*;
pub use types::*;
