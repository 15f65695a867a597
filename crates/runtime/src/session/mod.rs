//! Client session over one transport connection.
//!
//! [`ClientSession::establish`] runs the opening handshake and, once the
//! router welcomes the session, spawns two tasks:
//!
//! - the transport's inbound pump ([`TransportReceiver::run`])
//! - the dispatch loop, which routes `Result`, `Published` and `Error`
//!   replies to the [`RequestCorrelator`] and tears the session down on
//!   `Goodbye`, `Abort` or end of stream
//!
//! Callers use the session through the object-safe [`Session`] trait so
//! that owners of long-lived sessions can hand out their own implementation.

mod config;
mod handshake;


use std::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{Mutex as AsyncMutex, Notify, mpsc};
use tokio::task::JoinHandle;
use wamp_protocol::{CallOptions, CallResult, ClientMessage, Kwargs, PublishOptions, RequestKind, RouterMessage, uri};

pub use self::config::SessionConfig;
use self::handshake::handshake;
use crate::correlator::{Reply, RequestCorrelator};
use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// Operations available on an open WAMP session.
pub trait Session: Send + Sync {
	/// Router-assigned session id.
	fn id(&self) -> u64;

	/// Realm the session joined.
	fn realm(&self) -> &str;

	/// Authentication id the router accepted, if any.
	fn authid(&self) -> Option<&str>;

	/// Whether requests can still be issued.
	fn is_open(&self) -> bool;

	/// Calls a remote procedure and waits for its result.
	fn call(&self, procedure: &str, args: Vec<Value>, kwargs: Kwargs, options: CallOptions) -> BoxFuture<'_, Result<CallResult>>;

	/// Publishes an event. Waits for the router's acknowledgement only
	/// when `options` ask for one.
	fn publish(&self, topic: &str, args: Vec<Value>, kwargs: Kwargs, options: PublishOptions) -> BoxFuture<'_, Result<()>>;
}

/// Lifecycle of a [`ClientSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	/// Connection opened, nothing sent yet.
	Created,
	/// `Hello` sent, handshake in progress.
	Connecting,
	/// Welcomed by the router.
	Open,
	/// Left the realm in an orderly way.
	Closed,
	/// Handshake refused, aborted by the router, or connection lost.
	Failed,
}

impl SessionState {
	/// Whether no further transition can happen.
	pub fn is_terminal(self) -> bool {
		matches!(self, SessionState::Closed | SessionState::Failed)
	}
}

type SharedSender = Arc<AsyncMutex<Option<Box<dyn Transport>>>>;
type SharedState = Arc<Mutex<SessionState>>;

fn transition(state: &SharedState, next: SessionState) {
	let mut current = state.lock();
	if current.is_terminal() || *current == next {
		return;
	}
	tracing::trace!(target = "wamp.session", from = ?*current, to = ?next, "state change");
	*current = next;
}

/// WAMP client session bound to one connection.
pub struct ClientSession {
	id: u64,
	realm: String,
	authid: Option<String>,
	authrole: Option<String>,
	state: SharedState,
	correlator: Arc<RequestCorrelator>,
	sender: SharedSender,
	shutdown: Arc<Notify>,
	tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ClientSession {
	/// Joins `config.realm()` over an opened connection.
	///
	/// The connection is closed before any handshake failure is returned.
	pub async fn establish(parts: TransportParts, config: &SessionConfig) -> Result<Arc<Self>> {
		let TransportParts {
			mut sender,
			receiver,
			mut message_rx,
		} = parts;

		let state: SharedState = Arc::new(Mutex::new(SessionState::Created));
		let reader = spawn_reader(receiver);

		transition(&state, SessionState::Connecting);
		let welcome = match handshake(sender.as_mut(), &mut message_rx, config).await {
			Ok(welcome) => welcome,
			Err(err) => {
				transition(&state, SessionState::Failed);
				tracing::debug!(target = "wamp.session", realm = config.realm(), error = %err, "handshake failed");
				if let Err(close_err) = sender.close().await {
					tracing::debug!(target = "wamp.session", error = %close_err, "close after failed handshake");
				}
				reader.abort();
				return Err(err);
			}
		};

		let authid = welcome
			.details
			.get("authid")
			.and_then(Value::as_str)
			.map(str::to_string)
			.or_else(|| config.authid().map(str::to_string));
		let authrole = welcome.details.get("authrole").and_then(Value::as_str).map(str::to_string);

		tracing::debug!(
			target = "wamp.session",
			session = welcome.session,
			realm = config.realm(),
			authid = authid.as_deref().unwrap_or("anonymous"),
			"session established"
		);

		transition(&state, SessionState::Open);
		let correlator = Arc::new(RequestCorrelator::new());
		let sender: SharedSender = Arc::new(AsyncMutex::new(Some(sender)));
		let shutdown = Arc::new(Notify::new());

		let dispatcher = tokio::spawn(dispatch_loop(
			welcome.session,
			message_rx,
			Arc::clone(&state),
			Arc::clone(&correlator),
			Arc::clone(&sender),
			Arc::clone(&shutdown),
		));

		Ok(Arc::new(Self {
			id: welcome.session,
			realm: config.realm().to_string(),
			authid,
			authrole,
			state,
			correlator,
			sender,
			shutdown,
			tasks: Mutex::new(vec![reader, dispatcher]),
		}))
	}

	/// Router-assigned session id.
	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn realm(&self) -> &str {
		&self.realm
	}

	pub fn authid(&self) -> Option<&str> {
		self.authid.as_deref()
	}

	pub fn authrole(&self) -> Option<&str> {
		self.authrole.as_deref()
	}

	/// Current lifecycle state.
	pub fn state(&self) -> SessionState {
		*self.state.lock()
	}

	/// Whether requests can still be issued.
	pub fn is_open(&self) -> bool {
		!self.correlator.is_closed()
	}

	/// Request correlator backing this session.
	pub fn correlator(&self) -> &RequestCorrelator {
		&self.correlator
	}

	/// Calls `procedure` and waits for the router's `Result` or `Error`.
	pub async fn call(&self, procedure: &str, args: Vec<Value>, kwargs: Kwargs, options: CallOptions) -> Result<CallResult> {
		let (request, response) = self.correlator.register(RequestKind::Call)?;

		tracing::debug!(target = "wamp.session", session = self.id, request, procedure, "call");

		self.send(ClientMessage::Call {
			request,
			options,
			procedure: procedure.to_string(),
			args,
			kwargs,
		})
		.await?;

		match response.await? {
			Reply::Result(result) => Ok(result),
			other => Err(Error::Protocol(format!("unexpected reply to call {request}: {other:?}"))),
		}
	}

	/// Publishes to `topic`.
	///
	/// With `acknowledge` set, waits for `Published` or `Error`; otherwise
	/// completes once the message is handed to the transport.
	pub async fn publish(&self, topic: &str, args: Vec<Value>, kwargs: Kwargs, options: PublishOptions) -> Result<()> {
		if !options.is_acknowledged() {
			self.correlator.ensure_open()?;
			let request = self.correlator.next_id();
			tracing::debug!(target = "wamp.session", session = self.id, request, topic, "publish");
			return self
				.send(ClientMessage::Publish {
					request,
					options,
					topic: topic.to_string(),
					args,
					kwargs,
				})
				.await;
		}

		let (request, response) = self.correlator.register(RequestKind::Publish)?;

		tracing::debug!(target = "wamp.session", session = self.id, request, topic, "publish (acknowledged)");

		self.send(ClientMessage::Publish {
			request,
			options,
			topic: topic.to_string(),
			args,
			kwargs,
		})
		.await?;

		match response.await? {
			Reply::Published { publication } => {
				tracing::debug!(target = "wamp.session", session = self.id, request, publication, "published");
				Ok(())
			}
			other => Err(Error::Protocol(format!("unexpected reply to publish {request}: {other:?}"))),
		}
	}

	/// Leaves the realm and closes the connection.
	///
	/// Sends `Goodbye` when the connection is still up, then closes it.
	/// Pending requests fail with [`Error::SessionClosed`]. Calling this
	/// again is a no-op.
	pub async fn close(&self) -> Result<()> {
		self.correlator.reject_all("session closed by client");
		transition(&self.state, SessionState::Closed);
		self.shutdown.notify_one();

		let transport = self.sender.lock().await.take();
		let result = match transport {
			Some(mut transport) => {
				let goodbye = ClientMessage::Goodbye {
					reason: uri::CLOSE_NORMAL.to_string(),
					details: Kwargs::new(),
				};
				if let Err(err) = transport.send(goodbye).await {
					tracing::debug!(target = "wamp.session", session = self.id, error = %err, "goodbye not delivered");
				}
				transport.close().await
			}
			None => Ok(()),
		};

		for task in self.tasks.lock().drain(..) {
			task.abort();
		}

		tracing::debug!(target = "wamp.session", session = self.id, "session closed");
		result
	}

	async fn send(&self, message: ClientMessage) -> Result<()> {
		let mut sender = self.sender.lock().await;
		match sender.as_mut() {
			Some(transport) => transport.send(message).await,
			None => Err(Error::SessionClosed("transport closed".to_string())),
		}
	}
}

impl Drop for ClientSession {
	fn drop(&mut self) {
		self.shutdown.notify_one();
		for task in self.tasks.get_mut().drain(..) {
			task.abort();
		}
	}
}

impl Session for ClientSession {
	fn id(&self) -> u64 {
		self.id
	}

	fn realm(&self) -> &str {
		&self.realm
	}

	fn authid(&self) -> Option<&str> {
		self.authid.as_deref()
	}

	fn is_open(&self) -> bool {
		ClientSession::is_open(self)
	}

	fn call(&self, procedure: &str, args: Vec<Value>, kwargs: Kwargs, options: CallOptions) -> BoxFuture<'_, Result<CallResult>> {
		let procedure = procedure.to_string();
		Box::pin(async move { ClientSession::call(self, &procedure, args, kwargs, options).await })
	}

	fn publish(&self, topic: &str, args: Vec<Value>, kwargs: Kwargs, options: PublishOptions) -> BoxFuture<'_, Result<()>> {
		let topic = topic.to_string();
		Box::pin(async move { ClientSession::publish(self, &topic, args, kwargs, options).await })
	}
}

fn spawn_reader(receiver: Box<dyn TransportReceiver>) -> JoinHandle<()> {
	tokio::spawn(async move {
		if let Err(err) = receiver.run().await {
			tracing::debug!(target = "wamp.session", error = %err, "transport reader stopped");
		}
	})
}

async fn dispatch_loop(
	session: u64,
	mut message_rx: mpsc::UnboundedReceiver<RouterMessage>,
	state: SharedState,
	correlator: Arc<RequestCorrelator>,
	sender: SharedSender,
	shutdown: Arc<Notify>,
) {
	loop {
		let message = tokio::select! {
			message = message_rx.recv() => message,
			_ = shutdown.notified() => return,
		};

		let Some(message) = message else {
			tracing::debug!(target = "wamp.session", session, "transport closed");
			transition(&state, SessionState::Failed);
			correlator.reject_all("transport closed");
			return;
		};

		match message {
			RouterMessage::Result { request, args, kwargs } => {
				let reply = Reply::Result(CallResult { args, kwargs });
				if let Err(err) = correlator.resolve(request, RequestKind::Call, reply) {
					tracing::debug!(target = "wamp.session", session, error = %err, "dropped result");
				}
			}
			RouterMessage::Published { request, publication } => {
				if let Err(err) = correlator.resolve(request, RequestKind::Publish, Reply::Published { publication }) {
					tracing::debug!(target = "wamp.session", session, error = %err, "dropped publish acknowledgement");
				}
			}
			RouterMessage::Error {
				request_kind,
				request,
				error,
				args,
				kwargs,
			} => {
				let remote = Error::Remote { uri: error, args, kwargs };
				if let Err(err) = correlator.reject(request, request_kind, remote) {
					tracing::debug!(target = "wamp.session", session, error = %err, "dropped error reply");
				}
			}
			RouterMessage::Goodbye { reason, .. } => {
				tracing::debug!(target = "wamp.session", session, %reason, "router closed session");
				transition(&state, SessionState::Closed);
				correlator.reject_all(&format!("router closed session: {reason}"));
				leave(session, &sender).await;
				return;
			}
			RouterMessage::Abort { reason, .. } => {
				tracing::debug!(target = "wamp.session", session, %reason, "router aborted session");
				transition(&state, SessionState::Failed);
				correlator.reject_all(&format!("router aborted session: {reason}"));
				return;
			}
			other @ (RouterMessage::Welcome { .. } | RouterMessage::Challenge { .. }) => {
				tracing::warn!(target = "wamp.session", session, message = other.name(), "unexpected message on open session");
			}
		}
	}
}

/// Answers a router `Goodbye` and closes the connection.
async fn leave(session: u64, sender: &SharedSender) {
	let mut slot = sender.lock().await;
	let Some(transport) = slot.as_mut() else {
		return;
	};
	let reply = ClientMessage::Goodbye {
		reason: uri::GOODBYE_AND_OUT.to_string(),
		details: Kwargs::new(),
	};
	if let Err(err) = transport.send(reply).await {
		tracing::debug!(target = "wamp.session", session, error = %err, "goodbye reply not delivered");
	}
	if let Err(err) = transport.close().await {
		tracing::debug!(target = "wamp.session", session, error = %err, "close after goodbye");
	}
	*slot = None;
}
