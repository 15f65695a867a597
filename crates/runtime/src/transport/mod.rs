//! Transport seam between a client session and the network.
//!
//! A transport is split into three parts so the session can own each one
//! independently:
//!
//! - [`Transport`]: the sending half, which also closes the connection
//! - [`TransportReceiver`]: a pump that reads frames and forwards decoded
//!   [`RouterMessage`]s into a channel until the peer goes away
//! - the receiving end of that channel
//!
//! Framing and socket handling live behind [`TransportProvider`]. The
//! [`memory`] module ships an in-process implementation.

pub mod memory;


use std::fmt;

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use wamp_protocol::{ClientMessage, RouterMessage};

use crate::error::Result;

/// Sending half of a connection.
pub trait Transport: Send {
	/// Sends one message to the router.
	fn send(&mut self, message: ClientMessage) -> BoxFuture<'_, Result<()>>;

	/// Closes the connection. Closing twice is not an error.
	fn close(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Receiving half of a connection.
pub trait TransportReceiver: Send {
	/// Forwards inbound messages into the session's channel until the peer
	/// closes or the channel is dropped.
	fn run(self: Box<Self>) -> BoxFuture<'static, Result<()>>;
}

/// All parts of an opened connection, handed to the session.
pub struct TransportParts {
	/// Sending half.
	pub sender: Box<dyn Transport>,
	/// Inbound pump.
	pub receiver: Box<dyn TransportReceiver>,
	/// Channel the pump forwards into.
	pub message_rx: mpsc::UnboundedReceiver<RouterMessage>,
}

/// Opens connections to a router.
pub trait TransportProvider: Send + Sync {
	/// Opens one connection to `endpoint`.
	fn connect(&self, endpoint: &Endpoint) -> BoxFuture<'_, Result<TransportParts>>;
}

/// Network location and realm of a router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	/// Router hostname.
	pub host: String,
	/// Router port.
	pub port: u16,
	/// Realm joined on this router.
	pub realm: String,
}

impl Endpoint {
	/// Creates an endpoint.
	pub fn new(host: impl Into<String>, port: u16, realm: impl Into<String>) -> Self {
		Self {
			host: host.into(),
			port,
			realm: realm.into(),
		}
	}

	/// WebSocket URL of the router.
	pub fn url(&self) -> String {
		format!("ws://{}:{}", self.host, self.port)
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.url())
	}
}
