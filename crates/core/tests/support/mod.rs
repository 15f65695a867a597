//! Shared fixtures for manager integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::{Value, json};
use wamp::{CallOptions, CallResult, ErrorLog, Kwargs, PersistentSessionProvider, PublishOptions, Result, Session};
use wamp_protocol::{ClientMessage, RequestKind, RouterMessage};
use wamp_runtime::transport::memory::{CloseProbe, MemoryProvider, RouterEnd};
use wamp_runtime::{Endpoint, Error, TransportParts, TransportProvider};

/// One connection opened through [`ScriptedRouter`].
pub struct Connection {
	pub endpoint: Endpoint,
	pub probe: CloseProbe,
	pub received: Arc<Mutex<Vec<ClientMessage>>>,
}

impl Connection {
	pub fn received(&self) -> Vec<ClientMessage> {
		self.received.lock().clone()
	}

	pub fn hello(&self) -> Option<ClientMessage> {
		self.received().into_iter().find(|m| matches!(m, ClientMessage::Hello { .. }))
	}

	pub fn publish(&self) -> Option<ClientMessage> {
		self.received().into_iter().find(|m| matches!(m, ClientMessage::Publish { .. }))
	}
}

/// In-process router: welcomes every session and answers calls by
/// summing numeric arguments. Publications are acknowledged when asked.
#[derive(Clone, Default)]
pub struct ScriptedRouter {
	connections: Arc<Mutex<Vec<Connection>>>,
	challenge: Option<Kwargs>,
	publish_error: Option<String>,
}

impl ScriptedRouter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Challenges every session with WAMP-CRA using `extra`.
	pub fn with_challenge(mut self, extra: Value) -> Self {
		self.challenge = extra.as_object().cloned();
		self
	}

	/// Rejects every publication with the error `uri`.
	pub fn rejecting_publishes(mut self, uri: &str) -> Self {
		self.publish_error = Some(uri.to_string());
		self
	}

	pub fn provider(&self) -> Arc<dyn TransportProvider> {
		let router = self.clone();
		Arc::new(MemoryProvider::new(move |endpoint: &Endpoint, end: RouterEnd| {
			router.accept(endpoint, end);
		}))
	}

	pub fn connections(&self) -> parking_lot::MutexGuard<'_, Vec<Connection>> {
		self.connections.lock()
	}

	fn accept(&self, endpoint: &Endpoint, mut end: RouterEnd) {
		let received = Arc::new(Mutex::new(Vec::new()));
		self.connections.lock().push(Connection {
			endpoint: endpoint.clone(),
			probe: end.close_probe(),
			received: Arc::clone(&received),
		});

		let challenge = self.challenge.clone();
		let publish_error = self.publish_error.clone();
		tokio::spawn(async move {
			while let Some(message) = end.recv().await {
				received.lock().push(message.clone());
				let reply = match message {
					ClientMessage::Hello { .. } => match &challenge {
						Some(extra) => Some(RouterMessage::Challenge {
							auth_method: "wampcra".to_string(),
							extra: extra.clone(),
						}),
						None => Some(welcome()),
					},
					ClientMessage::Authenticate { .. } => Some(welcome()),
					ClientMessage::Call { request, args, .. } => Some(RouterMessage::Result {
						request,
						args: vec![json!(args.iter().filter_map(Value::as_i64).sum::<i64>())],
						kwargs: Kwargs::new(),
					}),
					ClientMessage::Publish { request, .. } if publish_error.is_some() => Some(RouterMessage::Error {
						request_kind: RequestKind::Publish,
						request,
						error: publish_error.clone().unwrap_or_default(),
						args: vec![json!("not allowed")],
						kwargs: Kwargs::new(),
					}),
					ClientMessage::Publish { request, options, .. } if options.is_acknowledged() => {
						Some(RouterMessage::Published {
							request,
							publication: request + 1000,
						})
					}
					_ => None,
				};
				if let Some(reply) = reply {
					let _ = end.send(reply);
				}
			}
		});
	}
}

fn welcome() -> RouterMessage {
	RouterMessage::Welcome {
		session: 77,
		details: Kwargs::new(),
	}
}

/// Provider whose connect always fails.
pub struct RefusingProvider;

impl TransportProvider for RefusingProvider {
	fn connect(&self, _: &Endpoint) -> BoxFuture<'_, Result<TransportParts>> {
		Box::pin(async { Err(Error::Io(std::io::Error::from(std::io::ErrorKind::ConnectionRefused))) })
	}
}

/// Error log that keeps every line.
#[derive(Default)]
pub struct RecordingLog {
	lines: Mutex<Vec<String>>,
}

impl RecordingLog {
	pub fn lines(&self) -> Vec<String> {
		self.lines.lock().clone()
	}
}

impl ErrorLog for RecordingLog {
	fn log_error(&self, message: &str) {
		self.lines.lock().push(message.to_string());
	}
}

/// What a [`RecordingSession`] was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
	Call {
		procedure: String,
		args: Vec<Value>,
		kwargs: Kwargs,
	},
	Publish {
		topic: String,
		args: Vec<Value>,
		kwargs: Kwargs,
		options: PublishOptions,
	},
}

/// Persistent session that records requests and returns a fixed result.
pub struct RecordingSession {
	pub requests: Mutex<Vec<Recorded>>,
	pub result: CallResult,
}

impl RecordingSession {
	pub fn new(result: CallResult) -> Arc<Self> {
		Arc::new(Self {
			requests: Mutex::new(Vec::new()),
			result,
		})
	}
}

impl Session for RecordingSession {
	fn id(&self) -> u64 {
		1
	}

	fn realm(&self) -> &str {
		"realm1"
	}

	fn authid(&self) -> Option<&str> {
		Some("worker")
	}

	fn is_open(&self) -> bool {
		true
	}

	fn call(&self, procedure: &str, args: Vec<Value>, kwargs: Kwargs, _: CallOptions) -> BoxFuture<'_, Result<CallResult>> {
		self.requests.lock().push(Recorded::Call {
			procedure: procedure.to_string(),
			args,
			kwargs,
		});
		let result = self.result.clone();
		Box::pin(async move { Ok(result) })
	}

	fn publish(&self, topic: &str, args: Vec<Value>, kwargs: Kwargs, options: PublishOptions) -> BoxFuture<'_, Result<()>> {
		self.requests.lock().push(Recorded::Publish {
			topic: topic.to_string(),
			args,
			kwargs,
			options,
		});
		Box::pin(async { Ok(()) })
	}
}

/// Provider reporting a fixed session, initialized or not.
pub struct FixedProvider {
	pub initialized: bool,
	pub session: Option<Arc<dyn Session>>,
}

impl PersistentSessionProvider for FixedProvider {
	fn is_initialized(&self) -> bool {
		self.initialized
	}

	fn active_session(&self) -> Option<Arc<dyn Session>> {
		self.session.clone()
	}
}
