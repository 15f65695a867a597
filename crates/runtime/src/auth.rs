//! Client-side authenticators.
//!
//! An authenticator answers a router challenge for one auth method. The
//! session offers the methods of all registered authenticators in `Hello`
//! and picks the matching one when a `Challenge` arrives.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use wamp_protocol::{Kwargs, WAMP_CRA};

use crate::error::{Error, Result};

const DEFAULT_ITERATIONS: u32 = 1000;
const DEFAULT_KEYLEN: usize = 32;
const MAX_KEYLEN: u64 = 1024;

/// Username and secret of an authenticated principal.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	username: String,
	secret: String,
}

impl Credential {
	/// Creates a credential.
	pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			secret: secret.into(),
		}
	}

	/// Principal identifier, used as the session's authid.
	pub fn username(&self) -> &str {
		&self.username
	}

	/// Shared secret.
	pub fn secret(&self) -> &str {
		&self.secret
	}
}

impl fmt::Debug for Credential {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credential")
			.field("username", &self.username)
			.field("secret", &"<redacted>")
			.finish()
	}
}

/// Answers router challenges for one authentication method.
pub trait ClientAuthenticator: Send + Sync {
	/// Method name offered in `Hello` (e.g. `wampcra`).
	fn auth_method(&self) -> &str;

	/// Authentication id this authenticator speaks for.
	fn authid(&self) -> &str;

	/// Computes the signature for a challenge's `extra` payload.
	fn sign(&self, extra: &Kwargs) -> Result<String>;
}

/// WAMP challenge-response authenticator.
///
/// The signature is `base64(HMAC-SHA256(key, challenge))`. The key is the
/// secret itself, or, when the router sends a `salt`, the base64 of the
/// PBKDF2-HMAC-SHA256 derivation of the secret.
#[derive(Debug, Clone)]
pub struct WampCraAuthenticator {
	credential: Credential,
}

impl WampCraAuthenticator {
	/// Creates an authenticator seeded with `username` and `secret`.
	pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
		Self {
			credential: Credential::new(username, secret),
		}
	}

	/// Creates an authenticator from an existing credential.
	pub fn from_credential(credential: Credential) -> Self {
		Self { credential }
	}

	/// Credential this authenticator was seeded with.
	pub fn credential(&self) -> &Credential {
		&self.credential
	}
}

impl ClientAuthenticator for WampCraAuthenticator {
	fn auth_method(&self) -> &str {
		WAMP_CRA
	}

	fn authid(&self) -> &str {
		self.credential.username()
	}

	fn sign(&self, extra: &Kwargs) -> Result<String> {
		let challenge = extra
			.get("challenge")
			.and_then(|c| c.as_str())
			.ok_or_else(|| Error::Authentication("wampcra challenge missing 'challenge'".to_string()))?;

		let key = match extra.get("salt").and_then(|s| s.as_str()) {
			Some(salt) => {
				let iterations = read_u64(extra, "iterations")?.unwrap_or(DEFAULT_ITERATIONS as u64);
				let keylen = read_u64(extra, "keylen")?.unwrap_or(DEFAULT_KEYLEN as u64);
				let iterations = u32::try_from(iterations)
					.map_err(|_| Error::Authentication(format!("wampcra iterations out of range: {iterations}")))?;
				if keylen == 0 || keylen > MAX_KEYLEN {
					return Err(Error::Authentication(format!("wampcra keylen out of range: {keylen}")));
				}
				derive_key(self.credential.secret(), salt, iterations, keylen as usize)
			}
			None => self.credential.secret().to_string(),
		};

		sign_challenge(&key, challenge)
	}
}

fn read_u64(extra: &Kwargs, field: &str) -> Result<Option<u64>> {
	match extra.get(field) {
		None => Ok(None),
		Some(value) => value
			.as_u64()
			.map(Some)
			.ok_or_else(|| Error::Authentication(format!("wampcra '{field}' must be a positive integer, got {value}"))),
	}
}

/// Signs `challenge` with `key`: `base64(HMAC-SHA256(key, challenge))`.
pub fn sign_challenge(key: &str, challenge: &str) -> Result<String> {
	let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key.as_bytes())
		.map_err(|e| Error::Authentication(format!("invalid signing key: {e}")))?;
	mac.update(challenge.as_bytes());
	Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Derives a salted key: `base64(PBKDF2-HMAC-SHA256(secret, salt, iterations, keylen))`.
pub fn derive_key(secret: &str, salt: &str, iterations: u32, keylen: usize) -> String {
	let mut derived = vec![0u8; keylen];
	pbkdf2::pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt.as_bytes(), iterations, &mut derived);
	STANDARD.encode(derived)
}
