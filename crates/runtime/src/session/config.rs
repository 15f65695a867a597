//! Per-session configuration handed to the handshake.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::ClientAuthenticator;

/// What a session announces in `Hello` and how it answers challenges.
#[derive(Clone, Default)]
pub struct SessionConfig {
	realm: String,
	authid: Option<String>,
	authenticators: Vec<Arc<dyn ClientAuthenticator>>,
	handshake_timeout: Option<Duration>,
}

impl SessionConfig {
	/// Anonymous configuration for `realm`.
	pub fn new(realm: impl Into<String>) -> Self {
		Self {
			realm: realm.into(),
			authid: None,
			authenticators: Vec::new(),
			handshake_timeout: None,
		}
	}

	/// Sets the authentication id announced in `Hello`.
	pub fn with_authid(mut self, authid: impl Into<String>) -> Self {
		self.authid = Some(authid.into());
		self
	}

	/// Registers an authenticator; its method is offered in `Hello`.
	pub fn with_authenticator(mut self, authenticator: Arc<dyn ClientAuthenticator>) -> Self {
		self.authenticators.push(authenticator);
		self
	}

	/// Bounds the wait for `Welcome`.
	pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
		self.handshake_timeout = Some(timeout);
		self
	}

	pub fn handshake_timeout(&self) -> Option<Duration> {
		self.handshake_timeout
	}

	pub fn realm(&self) -> &str {
		&self.realm
	}

	pub fn authid(&self) -> Option<&str> {
		self.authid.as_deref()
	}

	/// Auth methods offered, in registration order.
	pub fn auth_methods(&self) -> Vec<String> {
		self.authenticators.iter().map(|a| a.auth_method().to_string()).collect()
	}

	/// Authenticator for a challenged method.
	pub fn authenticator_for(&self, method: &str) -> Option<&Arc<dyn ClientAuthenticator>> {
		self.authenticators.iter().find(|a| a.auth_method() == method)
	}

	/// `true` when neither an authid nor an authenticator is set.
	pub fn is_anonymous(&self) -> bool {
		self.authid.is_none() && self.authenticators.is_empty()
	}
}

impl fmt::Debug for SessionConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionConfig")
			.field("realm", &self.realm)
			.field("authid", &self.authid)
			.field("auth_methods", &self.auth_methods())
			.field("handshake_timeout", &self.handshake_timeout)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::auth::WampCraAuthenticator;

	#[test]
	fn anonymous_by_default() {
		let config = SessionConfig::new("realm1");
		assert!(config.is_anonymous());
		assert!(config.auth_methods().is_empty());
		assert!(config.authenticator_for("wampcra").is_none());
	}

	#[test]
	fn authenticator_offers_its_method() {
		let config = SessionConfig::new("realm1")
			.with_authid("peter")
			.with_authenticator(Arc::new(WampCraAuthenticator::new("peter", "secret1")));

		assert!(!config.is_anonymous());
		assert_eq!(config.authid(), Some("peter"));
		assert_eq!(config.auth_methods(), vec!["wampcra".to_string()]);
		assert_eq!(config.authenticator_for("wampcra").map(|a| a.authid()), Some("peter"));
	}
}
