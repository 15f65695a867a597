//! Request/response correlation for one session.
//!
//! Every call, and every publish that asks for an acknowledgement, gets a
//! fresh request id and a oneshot channel. The dispatch loop settles the
//! channel when the router's reply with the same id arrives.
//!
//! # Lifecycle of a pending request
//!
//! 1. [`RequestCorrelator::register`] allocates an id and returns a
//!    [`ResponseFuture`]
//! 2. The caller sends the request and awaits the future
//! 3. The dispatch loop calls [`RequestCorrelator::resolve`] or
//!    [`RequestCorrelator::reject`] with the reply
//! 4. If the session closes first, [`RequestCorrelator::reject_all`] fails
//!    every outstanding request so none is left hanging
//! 5. If the caller drops the future, its guard unregisters the request


use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use wamp_protocol::{CallResult, MAX_ID, RequestId, RequestKind};

use crate::error::{Error, Result};

/// Successful router reply to a pending request.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
	/// Reply to a call.
	Result(CallResult),
	/// Acknowledgement of a publish.
	Published {
		/// Router-assigned publication id.
		publication: u64,
	},
}

/// One in-flight call or acknowledged publish.
pub struct PendingRequest {
	kind: RequestKind,
	created_at: Instant,
	sink: oneshot::Sender<Result<Reply>>,
}

impl PendingRequest {
	/// Kind of request awaiting a reply.
	pub fn kind(&self) -> RequestKind {
		self.kind
	}

	/// Time since the request was registered.
	pub fn age(&self) -> Duration {
		self.created_at.elapsed()
	}

	fn settle(self, result: Result<Reply>) {
		// The receiver may already be gone if the caller stopped waiting.
		let _ = self.sink.send(result);
	}
}

type PendingMap = Arc<DashMap<RequestId, PendingRequest>>;

/// RAII guard ensuring cleanup when a response future is dropped unresolved.
struct CancelGuard {
	id: RequestId,
	pending: PendingMap,
	completed: bool,
}

impl CancelGuard {
	fn new(id: RequestId, pending: PendingMap) -> Self {
		Self {
			id,
			pending,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}

		if self.pending.remove(&self.id).is_some() {
			tracing::debug!(target = "wamp.correlator", id = self.id, "removed orphaned request");
		}
	}
}

/// Future returned by [`RequestCorrelator::register`].
pub struct ResponseFuture {
	id: RequestId,
	rx: oneshot::Receiver<Result<Reply>>,
	guard: CancelGuard,
}

impl ResponseFuture {
	/// Request id this future waits on.
	pub fn id(&self) -> RequestId {
		self.id
	}
}

impl Future for ResponseFuture {
	type Output = Result<Reply>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.complete();
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// Maps request ids to pending result sinks for one session.
pub struct RequestCorrelator {
	last_id: AtomicU64,
	pending: PendingMap,
	closed: AtomicBool,
	close_reason: Mutex<Option<String>>,
}

impl Default for RequestCorrelator {
	fn default() -> Self {
		Self::new()
	}
}

impl RequestCorrelator {
	pub fn new() -> Self {
		Self {
			last_id: AtomicU64::new(0),
			pending: Arc::new(DashMap::new()),
			closed: AtomicBool::new(false),
			close_reason: Mutex::new(None),
		}
	}

	/// Allocates the next request id, in `1..=2^53`.
	pub fn next_id(&self) -> RequestId {
		self.last_id.fetch_add(1, Ordering::SeqCst) % MAX_ID + 1
	}

	/// Registers a request and returns its id with the future that settles
	/// when the reply arrives.
	pub fn register(&self, kind: RequestKind) -> Result<(RequestId, ResponseFuture)> {
		if self.is_closed() {
			return Err(self.closed_error());
		}

		let id = self.next_id();
		let (tx, rx) = oneshot::channel();
		self.pending.insert(
			id,
			PendingRequest {
				kind,
				created_at: Instant::now(),
				sink: tx,
			},
		);

		// reject_all may have drained the map between the check and the insert.
		if self.is_closed() {
			self.pending.remove(&id);
			return Err(self.closed_error());
		}

		tracing::debug!(target = "wamp.correlator", id, %kind, "registered request");

		let guard = CancelGuard::new(id, Arc::clone(&self.pending));
		Ok((id, ResponseFuture { id, rx, guard }))
	}

	/// Fulfills a pending request.
	pub fn resolve(&self, id: RequestId, kind: RequestKind, reply: Reply) -> Result<()> {
		self.settle(id, kind, Ok(reply))
	}

	/// Fails a pending request.
	pub fn reject(&self, id: RequestId, kind: RequestKind, error: Error) -> Result<()> {
		self.settle(id, kind, Err(error))
	}

	fn settle(&self, id: RequestId, kind: RequestKind, result: Result<Reply>) -> Result<()> {
		match self.pending.remove_if(&id, |_, pending| pending.kind == kind) {
			Some((_, pending)) => {
				pending.settle(result);
				Ok(())
			}
			None => match self.pending.get(&id).map(|p| p.kind) {
				Some(expected) => Err(Error::Protocol(format!("{kind} reply for {expected} request: id={id}"))),
				None => Err(Error::Protocol(format!("Cannot find request to respond: id={id}"))),
			},
		}
	}

	/// Closes the correlator and fails every outstanding request.
	///
	/// Later registrations fail with [`Error::SessionClosed`]. Returns the
	/// number of requests rejected.
	pub fn reject_all(&self, reason: &str) -> usize {
		{
			let mut close_reason = self.close_reason.lock();
			if close_reason.is_none() {
				*close_reason = Some(reason.to_string());
			}
		}
		self.closed.store(true, Ordering::SeqCst);

		let ids: Vec<RequestId> = self.pending.iter().map(|entry| *entry.key()).collect();
		let mut rejected = 0;
		for id in ids {
			if let Some((_, pending)) = self.pending.remove(&id) {
				pending.settle(Err(Error::SessionClosed(reason.to_string())));
				rejected += 1;
			}
		}

		if rejected > 0 {
			tracing::debug!(target = "wamp.correlator", rejected, reason, "rejected pending requests");
		}
		rejected
	}

	/// Fails requests that have waited at least `max_age`. Returns the
	/// number of requests expired.
	pub fn expire_older_than(&self, max_age: Duration) -> usize {
		let ids: Vec<RequestId> = self
			.pending
			.iter()
			.filter(|entry| entry.value().age() >= max_age)
			.map(|entry| *entry.key())
			.collect();

		let mut expired = 0;
		for id in ids {
			if let Some((_, pending)) = self.pending.remove(&id) {
				let message = format!("{} request {id} unanswered after {}ms", pending.kind, max_age.as_millis());
				pending.settle(Err(Error::Timeout(message)));
				expired += 1;
			}
		}
		expired
	}

	/// Number of requests awaiting a reply.
	pub fn pending_count(&self) -> usize {
		self.pending.len()
	}

	/// Whether [`reject_all`](Self::reject_all) has been called.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	/// Fails with [`Error::SessionClosed`] once the correlator is closed.
	pub fn ensure_open(&self) -> Result<()> {
		if self.is_closed() {
			return Err(self.closed_error());
		}
		Ok(())
	}

	fn closed_error(&self) -> Error {
		let reason = self.close_reason.lock().clone().unwrap_or_else(|| "session closed".to_string());
		Error::SessionClosed(reason)
	}
}
