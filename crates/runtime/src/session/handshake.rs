//! Opening handshake: `Hello` → (`Challenge` → `Authenticate`)* → `Welcome`.

use tokio::sync::mpsc;
use wamp_protocol::{ClientMessage, HelloDetails, Kwargs, RouterMessage};

use super::SessionConfig;
use crate::error::{Error, Result};
use crate::transport::Transport;

/// Outcome of a successful handshake.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Welcome {
	pub session: u64,
	pub details: Kwargs,
}

/// Runs the handshake, bounded by the configured handshake timeout.
pub(crate) async fn handshake(
	sender: &mut dyn Transport,
	message_rx: &mut mpsc::UnboundedReceiver<RouterMessage>,
	config: &SessionConfig,
) -> Result<Welcome> {
	let Some(timeout) = config.handshake_timeout() else {
		return exchange(sender, message_rx, config).await;
	};

	match tokio::time::timeout(timeout, exchange(sender, message_rx, config)).await {
		Ok(outcome) => outcome,
		Err(_) => Err(Error::Timeout(format!(
			"no welcome from realm '{}' after {}ms",
			config.realm(),
			timeout.as_millis()
		))),
	}
}

/// Exchanges messages until the router welcomes or refuses the session.
async fn exchange(
	sender: &mut dyn Transport,
	message_rx: &mut mpsc::UnboundedReceiver<RouterMessage>,
	config: &SessionConfig,
) -> Result<Welcome> {
	sender
		.send(ClientMessage::Hello {
			realm: config.realm().to_string(),
			details: HelloDetails::caller_publisher(config.authid().map(str::to_string), config.auth_methods()),
		})
		.await?;

	loop {
		let message = message_rx
			.recv()
			.await
			.ok_or_else(|| Error::Transport("connection closed during handshake".to_string()))?;

		match message {
			RouterMessage::Welcome { session, details } => {
				return Ok(Welcome { session, details });
			}
			RouterMessage::Challenge { auth_method, extra } => {
				let authenticator = config
					.authenticator_for(&auth_method)
					.ok_or_else(|| Error::Authentication(format!("no authenticator for challenge method '{auth_method}'")))?;

				tracing::debug!(
					target = "wamp.session",
					method = %auth_method,
					authid = authenticator.authid(),
					"answering challenge"
				);

				let signature = authenticator.sign(&extra)?;
				sender
					.send(ClientMessage::Authenticate {
						signature,
						extra: Kwargs::new(),
					})
					.await?;
			}
			RouterMessage::Abort { reason, details } => {
				return Err(Error::Aborted {
					reason,
					message: details.get("message").and_then(|m| m.as_str()).map(str::to_string),
				});
			}
			other => {
				return Err(Error::Protocol(format!("unexpected '{}' during handshake", other.name())));
			}
		}
	}
}
