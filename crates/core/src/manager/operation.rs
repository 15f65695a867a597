//! Handle to an operation running on the tokio runtime.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::error::{Error, Result};

/// Which kind of session an operation runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
	/// The process-wide persistent session.
	Persistent,
	/// A session opened for this operation and closed after it.
	Ephemeral,
}

impl fmt::Display for SessionSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SessionSource::Persistent => f.write_str("persistent"),
			SessionSource::Ephemeral => f.write_str("ephemeral"),
		}
	}
}

/// Eventual outcome of a `call` or `publish`.
///
/// The operation runs on a spawned task. Awaiting yields its result;
/// dropping the handle detaches it and the operation still completes.
#[must_use = "dropping a Pending detaches the operation and discards its result"]
pub struct Pending<T> {
	handle: JoinHandle<Result<T>>,
	source: SessionSource,
}

impl<T> Pending<T> {
	pub(crate) fn new(handle: JoinHandle<Result<T>>, source: SessionSource) -> Self {
		Self { handle, source }
	}

	/// Session kind chosen when the operation started.
	pub fn source(&self) -> SessionSource {
		self.source
	}

	/// Whether the operation has finished.
	pub fn is_finished(&self) -> bool {
		self.handle.is_finished()
	}
}

impl<T> Future for Pending<T> {
	type Output = Result<T>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
			Ok(result) => result,
			Err(err) => Err(Error::Runtime(format!("operation task failed: {err}"))),
		})
	}
}

impl<T> fmt::Debug for Pending<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Pending")
			.field("source", &self.source)
			.field("finished", &self.handle.is_finished())
			.finish()
	}
}
