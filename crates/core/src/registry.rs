//! Lookup of the process-wide persistent session.
//!
//! Some processes keep one long-lived session open (typically owned by a
//! background worker). Operations reuse it when it is up and fall back to a
//! per-operation session otherwise. The registry only looks; it never opens
//! or closes the shared session.

use std::sync::Arc;

use parking_lot::RwLock;
use wamp_runtime::Session;

use crate::error::{Error, Result};

/// Owner of the process-wide persistent session.
pub trait PersistentSessionProvider: Send + Sync {
	/// Whether the owner has finished starting up.
	fn is_initialized(&self) -> bool;

	/// The shared session, if one exists.
	fn active_session(&self) -> Option<Arc<dyn Session>>;
}

/// Read-only view of the persistent session.
#[derive(Clone, Default)]
pub struct SessionRegistry {
	provider: Option<Arc<dyn PersistentSessionProvider>>,
}

impl SessionRegistry {
	/// Registry for a process without a persistent session.
	pub fn none() -> Self {
		Self { provider: None }
	}

	pub fn new(provider: Arc<dyn PersistentSessionProvider>) -> Self {
		Self { provider: Some(provider) }
	}

	/// Returns the shared session when its owner is initialized and the
	/// session is open.
	pub fn try_get_persistent(&self) -> Option<Arc<dyn Session>> {
		let provider = self.provider.as_ref()?;
		if !provider.is_initialized() {
			return None;
		}
		provider.active_session().filter(|session| session.is_open())
	}
}

/// Holds at most one persistent session for the process.
#[derive(Default)]
pub struct SessionSlot {
	session: RwLock<Option<Arc<dyn Session>>>,
}

impl SessionSlot {
	pub fn new() -> Self {
		Self::default()
	}

	/// Installs `session` as the persistent session.
	///
	/// Fails while another open session is installed; a closed one is
	/// replaced.
	pub fn install(&self, session: Arc<dyn Session>) -> Result<()> {
		let mut slot = self.session.write();
		if let Some(current) = slot.as_ref().filter(|s| s.is_open()) {
			return Err(Error::Configuration(format!(
				"a persistent session is already installed (session {})",
				current.id()
			)));
		}

		tracing::debug!(target = "wamp.registry", session = session.id(), realm = session.realm(), "persistent session installed");
		*slot = Some(session);
		Ok(())
	}

	/// Removes and returns the installed session.
	pub fn take(&self) -> Option<Arc<dyn Session>> {
		let session = self.session.write().take();
		if let Some(session) = &session {
			tracing::debug!(target = "wamp.registry", session = session.id(), "persistent session removed");
		}
		session
	}
}

impl PersistentSessionProvider for SessionSlot {
	fn is_initialized(&self) -> bool {
		self.session.read().is_some()
	}

	fn active_session(&self) -> Option<Arc<dyn Session>> {
		self.session.read().clone()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicBool, Ordering};

	use futures_util::future::BoxFuture;
	use serde_json::Value;
	use wamp_protocol::{CallOptions, CallResult, Kwargs, PublishOptions};

	use super::*;

	struct FixedSession {
		id: u64,
		open: AtomicBool,
	}

	impl FixedSession {
		fn open(id: u64) -> Arc<Self> {
			Arc::new(Self {
				id,
				open: AtomicBool::new(true),
			})
		}
	}

	impl Session for FixedSession {
		fn id(&self) -> u64 {
			self.id
		}

		fn realm(&self) -> &str {
			"realm1"
		}

		fn authid(&self) -> Option<&str> {
			None
		}

		fn is_open(&self) -> bool {
			self.open.load(Ordering::SeqCst)
		}

		fn call(&self, _: &str, _: Vec<Value>, _: Kwargs, _: CallOptions) -> BoxFuture<'_, Result<CallResult>> {
			Box::pin(async { Ok(CallResult::default()) })
		}

		fn publish(&self, _: &str, _: Vec<Value>, _: Kwargs, _: PublishOptions) -> BoxFuture<'_, Result<()>> {
			Box::pin(async { Ok(()) })
		}
	}

	struct Uninitialized(Arc<FixedSession>);

	impl PersistentSessionProvider for Uninitialized {
		fn is_initialized(&self) -> bool {
			false
		}

		fn active_session(&self) -> Option<Arc<dyn Session>> {
			Some(self.0.clone())
		}
	}

	#[test]
	fn no_provider_means_no_session() {
		assert!(SessionRegistry::none().try_get_persistent().is_none());
	}

	#[test]
	fn uninitialized_provider_is_ignored() {
		let registry = SessionRegistry::new(Arc::new(Uninitialized(FixedSession::open(1))));
		assert!(registry.try_get_persistent().is_none());
	}

	#[test]
	fn open_installed_session_is_returned() {
		let slot = Arc::new(SessionSlot::new());
		let registry = SessionRegistry::new(slot.clone());
		assert!(registry.try_get_persistent().is_none());

		slot.install(FixedSession::open(5)).unwrap();
		assert_eq!(registry.try_get_persistent().map(|s| s.id()), Some(5));
	}

	#[test]
	fn closed_session_is_not_returned() {
		let session = FixedSession::open(5);
		let slot = Arc::new(SessionSlot::new());
		slot.install(session.clone()).unwrap();
		session.open.store(false, Ordering::SeqCst);

		let registry = SessionRegistry::new(slot.clone());
		assert!(registry.try_get_persistent().is_none());
		assert!(slot.is_initialized());
	}

	#[test]
	fn slot_refuses_second_open_session() {
		let slot = SessionSlot::new();
		let first = FixedSession::open(1);
		slot.install(first.clone()).unwrap();

		assert!(matches!(slot.install(FixedSession::open(2)), Err(Error::Configuration(_))));

		first.open.store(false, Ordering::SeqCst);
		slot.install(FixedSession::open(3)).unwrap();
		assert_eq!(slot.active_session().map(|s| s.id()), Some(3));

		assert_eq!(slot.take().map(|s| s.id()), Some(3));
		assert!(!slot.is_initialized());
	}
}
