//! Static client configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wamp_runtime::Endpoint;

use crate::error::{Error, Result};

/// Router location and realm used for every ephemeral session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
	/// Realm joined by every session.
	pub realm: String,
	/// Router hostname.
	pub server: String,
	/// Router port.
	pub port: u16,
	/// Upper bound for one ephemeral operation (connect, handshake, request).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timeout_ms: Option<u64>,
}

impl ClientConfig {
	pub fn new(realm: impl Into<String>, server: impl Into<String>, port: u16) -> Self {
		Self {
			realm: realm.into(),
			server: server.into(),
			port,
			timeout_ms: None,
		}
	}

	/// Bounds each ephemeral operation to `timeout_ms` milliseconds.
	pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.timeout_ms = Some(timeout_ms);
		self
	}

	/// Rejects an empty realm or server and port 0.
	pub fn validate(&self) -> Result<()> {
		if self.realm.trim().is_empty() {
			return Err(Error::Configuration("realm must not be empty".to_string()));
		}
		if self.server.trim().is_empty() {
			return Err(Error::Configuration("server must not be empty".to_string()));
		}
		if self.port == 0 {
			return Err(Error::Configuration("port must be between 1 and 65535".to_string()));
		}
		if self.timeout_ms == Some(0) {
			return Err(Error::Configuration("timeoutMs must be greater than zero".to_string()));
		}
		Ok(())
	}

	/// Router endpoint for ephemeral connections.
	pub fn endpoint(&self) -> Endpoint {
		Endpoint::new(&self.server, self.port, &self.realm)
	}

	pub fn timeout(&self) -> Option<Duration> {
		self.timeout_ms.map(Duration::from_millis)
	}

	/// Loads and validates a JSON configuration file.
	pub fn from_file(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)?;
		let config: Self = serde_json::from_str(&content)?;
		config.validate()?;
		Ok(config)
	}

	/// Writes the configuration as pretty-printed JSON.
	pub fn save(&self, path: &Path) -> Result<()> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::write(path, serde_json::to_string_pretty(self)?)?;
		Ok(())
	}
}
