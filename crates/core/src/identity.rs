//! Who ephemeral sessions authenticate as.

use std::sync::Arc;

use wamp_runtime::{Credential, SessionConfig, WampCraAuthenticator};

/// Identity of the current principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
	/// No credentials; sessions join without authentication.
	Anonymous,
	/// Sessions authenticate with WAMP-CRA as this principal.
	Authenticated(Credential),
}

impl Identity {
	pub fn authenticated(username: impl Into<String>, secret: impl Into<String>) -> Self {
		Identity::Authenticated(Credential::new(username, secret))
	}

	pub fn credential(&self) -> Option<&Credential> {
		match self {
			Identity::Anonymous => None,
			Identity::Authenticated(credential) => Some(credential),
		}
	}

	/// Session configuration for `realm` under this identity.
	///
	/// An authenticated identity sets the authid to the username and offers
	/// WAMP-CRA; an anonymous one offers no auth methods.
	pub fn session_config(&self, realm: &str) -> SessionConfig {
		let config = SessionConfig::new(realm);
		match self {
			Identity::Anonymous => config,
			Identity::Authenticated(credential) => config
				.with_authid(credential.username())
				.with_authenticator(Arc::new(WampCraAuthenticator::from_credential(credential.clone()))),
		}
	}
}

/// Supplies the identity in effect when an operation starts.
pub trait CredentialSource: Send + Sync {
	fn current_identity(&self) -> Identity;
}

/// Always anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousCredentials;

impl CredentialSource for AnonymousCredentials {
	fn current_identity(&self) -> Identity {
		Identity::Anonymous
	}
}

/// Always the same identity.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Identity);

impl StaticCredentials {
	pub fn new(identity: Identity) -> Self {
		Self(identity)
	}
}

impl CredentialSource for StaticCredentials {
	fn current_identity(&self) -> Identity {
		self.0.clone()
	}
}

impl<F> CredentialSource for F
where
	F: Fn() -> Identity + Send + Sync,
{
	fn current_identity(&self) -> Identity {
		self()
	}
}

#[cfg(test)]
mod tests {
	use parking_lot::Mutex;

	use super::*;

	#[test]
	fn anonymous_config_offers_nothing() {
		let config = AnonymousCredentials.current_identity().session_config("realm1");
		assert_eq!(config.realm(), "realm1");
		assert!(config.is_anonymous());
	}

	#[test]
	fn authenticated_config_uses_username_and_wampcra() {
		let source = StaticCredentials::new(Identity::authenticated("peter", "secret1"));
		let config = source.current_identity().session_config("realm1");

		assert_eq!(config.authid(), Some("peter"));
		assert_eq!(config.auth_methods(), vec!["wampcra".to_string()]);
	}

	#[test]
	fn closure_source_is_read_each_time() {
		let current = Mutex::new(Identity::Anonymous);
		let source = || current.lock().clone();

		assert_eq!(source.current_identity(), Identity::Anonymous);
		*current.lock() = Identity::authenticated("peter", "secret1");
		assert_eq!(source.current_identity().credential().map(|c| c.username().to_string()), Some("peter".to_string()));
	}
}
