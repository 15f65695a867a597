//! Call and publish through the persistent session or a per-operation one.
//!
//! Every operation first canonicalizes its arguments, synchronously, so bad
//! input fails before anything touches the network. It then looks for an
//! open persistent session:
//!
//! - **Persistent**: the request goes out on the shared session with the
//!   caller's options as given. The manager never opens or closes that
//!   session.
//! - **Ephemeral**: a fresh connection is opened with the identity in
//!   effect at call time, the request runs, and the connection is closed.
//!   Publications are always acknowledged on this path so the connection
//!   is not torn down before the router has the event.
//!
//! Both paths return a [`Pending`] right away. Ephemeral failures are also
//! written to the configured [`ErrorLog`].

mod ephemeral;
mod operation;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;
use wamp_protocol::{CallOptions, CallResult, PublishOptions};
use wamp_runtime::TransportProvider;

pub use self::ephemeral::EphemeralState;
use self::ephemeral::EphemeralClient;
pub use self::operation::{Pending, SessionSource};
use crate::codec::{Codec, JsonCodec, Payload};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::identity::{AnonymousCredentials, CredentialSource, Identity};
use crate::logging::{ErrorLog, TracingErrorLog};
use crate::registry::{PersistentSessionProvider, SessionRegistry};

struct Inner {
	config: ClientConfig,
	transports: Arc<dyn TransportProvider>,
	credentials: Arc<dyn CredentialSource>,
	codec: Arc<dyn Codec>,
	error_log: Arc<dyn ErrorLog>,
	registry: SessionRegistry,
}

impl Inner {
	fn ephemeral(&self, identity: &Identity) -> EphemeralClient<'_> {
		EphemeralClient::new(
			self.transports.as_ref(),
			self.config.endpoint(),
			identity.session_config(&self.config.realm),
			self.config.timeout(),
		)
	}
}

/// Issues calls and publications for the process.
///
/// Cheap to clone; clones share configuration and collaborators.
#[derive(Clone)]
pub struct ClientSessionManager {
	inner: Arc<Inner>,
}

impl ClientSessionManager {
	/// Starts building a manager that opens ephemeral connections through
	/// `transports`.
	pub fn builder(config: ClientConfig, transports: Arc<dyn TransportProvider>) -> ClientSessionManagerBuilder {
		ClientSessionManagerBuilder {
			config,
			transports,
			credentials: None,
			codec: None,
			error_log: None,
			registry: SessionRegistry::none(),
		}
	}

	pub fn config(&self) -> &ClientConfig {
		&self.inner.config
	}

	pub fn registry(&self) -> &SessionRegistry {
		&self.inner.registry
	}

	/// Publishes `args` and `kwargs` to `topic`.
	///
	/// Fails synchronously for an empty topic, arguments that cannot be
	/// canonicalized, or when called outside a tokio runtime. Everything
	/// else is reported through the returned [`Pending`].
	pub fn publish<A, K>(&self, topic: &str, args: &A, kwargs: &K, options: PublishOptions) -> Result<Pending<()>>
	where
		A: Serialize + ?Sized,
		K: Serialize + ?Sized,
	{
		require_uri("topic", topic)?;
		let payload = Payload::canonical(self.inner.codec.as_ref(), args, kwargs)?;
		let runtime = current_runtime()?;
		let topic = topic.to_string();

		if let Some(session) = self.inner.registry.try_get_persistent() {
			tracing::debug!(target = "wamp.client", %topic, session = session.id(), "publishing on persistent session");
			let handle = runtime.spawn(async move { session.publish(&topic, payload.args, payload.kwargs, options).await });
			return Ok(Pending::new(handle, SessionSource::Persistent));
		}

		let identity = self.inner.credentials.current_identity();
		let options = options.acknowledge(true);
		let inner = Arc::clone(&self.inner);

		tracing::debug!(target = "wamp.client", %topic, "publishing on ephemeral session");
		let handle = runtime.spawn(async move {
			let mut client = inner.ephemeral(&identity);
			let result = client
				.run(|session| {
					let topic = topic.clone();
					async move { session.publish(&topic, payload.args, payload.kwargs, options).await }
				})
				.await;

			if let Err(err) = &result {
				inner
					.error_log
					.log_error(&format!("Got the following error when trying to publish to '{topic}': {err}"));
			}
			result
		});
		Ok(Pending::new(handle, SessionSource::Ephemeral))
	}

	/// Calls `procedure` with positional arguments only.
	pub fn call<A>(&self, procedure: &str, args: &A) -> Result<Pending<CallResult>>
	where
		A: Serialize + ?Sized,
	{
		self.call_with(procedure, args, &Value::Null, CallOptions::default())
	}

	/// Calls `procedure` and resolves with the remote result as received.
	///
	/// Synchronous failures are the same as for [`publish`](Self::publish).
	pub fn call_with<A, K>(&self, procedure: &str, args: &A, kwargs: &K, options: CallOptions) -> Result<Pending<CallResult>>
	where
		A: Serialize + ?Sized,
		K: Serialize + ?Sized,
	{
		require_uri("procedure", procedure)?;
		let payload = Payload::canonical(self.inner.codec.as_ref(), args, kwargs)?;
		let runtime = current_runtime()?;
		let procedure = procedure.to_string();

		if let Some(session) = self.inner.registry.try_get_persistent() {
			tracing::debug!(target = "wamp.client", %procedure, session = session.id(), "calling on persistent session");
			let handle = runtime.spawn(async move { session.call(&procedure, payload.args, payload.kwargs, options).await });
			return Ok(Pending::new(handle, SessionSource::Persistent));
		}

		let identity = self.inner.credentials.current_identity();
		let inner = Arc::clone(&self.inner);

		tracing::debug!(target = "wamp.client", %procedure, "calling on ephemeral session");
		let handle = runtime.spawn(async move {
			let mut client = inner.ephemeral(&identity);
			let result = client
				.run(|session| {
					let procedure = procedure.clone();
					async move { session.call(&procedure, payload.args, payload.kwargs, options).await }
				})
				.await;

			if let Err(err) = &result {
				inner
					.error_log
					.log_error(&format!("Got the following error when trying to call '{procedure}': {err}"));
			}
			result
		});
		Ok(Pending::new(handle, SessionSource::Ephemeral))
	}
}

/// Builder for [`ClientSessionManager`].
pub struct ClientSessionManagerBuilder {
	config: ClientConfig,
	transports: Arc<dyn TransportProvider>,
	credentials: Option<Arc<dyn CredentialSource>>,
	codec: Option<Arc<dyn Codec>>,
	error_log: Option<Arc<dyn ErrorLog>>,
	registry: SessionRegistry,
}

impl ClientSessionManagerBuilder {
	/// Identity source for ephemeral sessions. Defaults to anonymous.
	pub fn credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
		self.credentials = Some(credentials);
		self
	}

	/// Codec used to canonicalize arguments. Defaults to JSON.
	pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
		self.codec = Some(codec);
		self
	}

	/// Sink for ephemeral failures. Defaults to [`TracingErrorLog`].
	pub fn error_log(mut self, error_log: Arc<dyn ErrorLog>) -> Self {
		self.error_log = Some(error_log);
		self
	}

	/// Owner of the persistent session, if the process keeps one.
	pub fn persistent(mut self, provider: Arc<dyn PersistentSessionProvider>) -> Self {
		self.registry = SessionRegistry::new(provider);
		self
	}

	/// Validates the configuration and builds the manager.
	pub fn build(self) -> Result<ClientSessionManager> {
		self.config.validate()?;

		Ok(ClientSessionManager {
			inner: Arc::new(Inner {
				config: self.config,
				transports: self.transports,
				credentials: self.credentials.unwrap_or_else(|| Arc::new(AnonymousCredentials)),
				codec: self.codec.unwrap_or_else(|| Arc::new(JsonCodec)),
				error_log: self.error_log.unwrap_or_else(|| Arc::new(TracingErrorLog)),
				registry: self.registry,
			}),
		})
	}
}

fn require_uri(what: &str, uri: &str) -> Result<()> {
	if uri.trim().is_empty() {
		return Err(Error::InvalidArgument(format!("{what} must not be empty")));
	}
	Ok(())
}

fn current_runtime() -> Result<Handle> {
	Handle::try_current().map_err(|err| Error::Runtime(err.to_string()))
}
