//! In-process transport backed by unbounded channels.
//!
//! [`pair`] returns the client's [`TransportParts`] together with the
//! [`RouterEnd`] a router implementation (or a test) drives. Messages are
//! passed as typed values, so no framing is involved.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use wamp_protocol::{ClientMessage, RouterMessage};

use super::{Endpoint, Transport, TransportParts, TransportProvider, TransportReceiver};
use crate::error::{Error, Result};

#[derive(Default)]
struct CloseState {
	closed: AtomicBool,
	close_calls: AtomicUsize,
}

/// Creates a connected client/router pair.
pub fn pair() -> (TransportParts, RouterEnd) {
	let (client_tx, client_rx) = mpsc::unbounded_channel();
	let (router_tx, router_rx) = mpsc::unbounded_channel();
	let (message_tx, message_rx) = mpsc::unbounded_channel();
	let state = Arc::new(CloseState::default());

	let parts = TransportParts {
		sender: Box::new(MemorySender {
			tx: Some(client_tx),
			state: Arc::clone(&state),
		}),
		receiver: Box::new(MemoryReceiver { peer_rx: router_rx, message_tx }),
		message_rx,
	};

	let router = RouterEnd {
		inbound: client_rx,
		outbound: router_tx,
		state,
	};

	(parts, router)
}

struct MemorySender {
	tx: Option<mpsc::UnboundedSender<ClientMessage>>,
	state: Arc<CloseState>,
}

impl Transport for MemorySender {
	fn send(&mut self, message: ClientMessage) -> BoxFuture<'_, Result<()>> {
		let result = match &self.tx {
			Some(tx) => tx.send(message).map_err(|_| Error::Transport("router hung up".to_string())),
			None => Err(Error::Transport("connection closed".to_string())),
		};
		Box::pin(async move { result })
	}

	fn close(&mut self) -> BoxFuture<'_, Result<()>> {
		self.state.close_calls.fetch_add(1, Ordering::SeqCst);
		self.state.closed.store(true, Ordering::SeqCst);
		self.tx = None;
		Box::pin(async { Ok(()) })
	}
}

struct MemoryReceiver {
	peer_rx: mpsc::UnboundedReceiver<RouterMessage>,
	message_tx: mpsc::UnboundedSender<RouterMessage>,
}

impl TransportReceiver for MemoryReceiver {
	fn run(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
		let MemoryReceiver { mut peer_rx, message_tx } = *self;
		Box::pin(async move {
			while let Some(message) = peer_rx.recv().await {
				if message_tx.send(message).is_err() {
					break;
				}
			}
			Ok(())
		})
	}
}

/// Router side of an in-process connection.
pub struct RouterEnd {
	inbound: mpsc::UnboundedReceiver<ClientMessage>,
	outbound: mpsc::UnboundedSender<RouterMessage>,
	state: Arc<CloseState>,
}

impl RouterEnd {
	/// Receives the next client message; `None` once the client closed.
	pub async fn recv(&mut self) -> Option<ClientMessage> {
		self.inbound.recv().await
	}

	/// Sends a message to the client.
	pub fn send(&self, message: RouterMessage) -> Result<()> {
		self.outbound.send(message).map_err(|_| Error::ChannelClosed)
	}

	/// Whether the client closed its side.
	pub fn is_closed(&self) -> bool {
		self.state.closed.load(Ordering::SeqCst)
	}

	/// Number of times the client called [`Transport::close`].
	pub fn close_calls(&self) -> usize {
		self.state.close_calls.load(Ordering::SeqCst)
	}

	/// Handle that keeps observing close state after the router end is
	/// moved into a router task.
	pub fn close_probe(&self) -> CloseProbe {
		CloseProbe(Arc::clone(&self.state))
	}
}

/// Observes whether and how often the client closed a memory connection.
#[derive(Clone)]
pub struct CloseProbe(Arc<CloseState>);

impl CloseProbe {
	/// Whether the client closed its side.
	pub fn is_closed(&self) -> bool {
		self.0.closed.load(Ordering::SeqCst)
	}

	/// Number of times the client called [`Transport::close`].
	pub fn close_calls(&self) -> usize {
		self.0.close_calls.load(Ordering::SeqCst)
	}
}

/// [`TransportProvider`] that hands each new [`RouterEnd`] to a callback.
///
/// The callback usually spawns a task that plays the router's part.
pub struct MemoryProvider<F> {
	on_connect: F,
	connections: AtomicUsize,
}

impl<F> MemoryProvider<F>
where
	F: Fn(&Endpoint, RouterEnd) + Send + Sync,
{
	/// Creates a provider that passes every new connection to `on_connect`.
	pub fn new(on_connect: F) -> Self {
		Self {
			on_connect,
			connections: AtomicUsize::new(0),
		}
	}

	/// Number of connections opened so far.
	pub fn connections(&self) -> usize {
		self.connections.load(Ordering::SeqCst)
	}
}

impl<F> TransportProvider for MemoryProvider<F>
where
	F: Fn(&Endpoint, RouterEnd) + Send + Sync,
{
	fn connect(&self, endpoint: &Endpoint) -> BoxFuture<'_, Result<TransportParts>> {
		self.connections.fetch_add(1, Ordering::SeqCst);
		let (parts, router) = pair();
		(self.on_connect)(endpoint, router);
		Box::pin(async move { Ok(parts) })
	}
}
