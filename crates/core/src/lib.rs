//! wamp: WAMP caller/publisher client
//!
//! Issues remote procedure calls and publications against a WAMP router.
//! Each operation runs on the process-wide persistent session when one is
//! open, and otherwise on a short-lived session opened for that operation
//! alone.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use wamp::{ClientConfig, ClientSessionManager, Identity, PublishOptions, StaticCredentials};
//!
//! let config = ClientConfig::from_file("wamp.json".as_ref())?;
//! let manager = ClientSessionManager::builder(config, transports)
//!     .credentials(Arc::new(StaticCredentials::new(Identity::authenticated("peter", "secret1"))))
//!     .build()?;
//!
//! manager.publish("chat.message", &["hello"], &(), PublishOptions::new())?.await?;
//! let sum = manager.call("add", &[2, 3])?.await?;
//! ```
//!
//! # Collaborators
//!
//! - [`TransportProvider`]: opens connections (an in-memory implementation
//!   lives in [`wamp_runtime::transport::memory`])
//! - [`CredentialSource`]: identity used by ephemeral sessions
//! - [`PersistentSessionProvider`]: owner of the long-lived session
//! - [`Codec`]: canonicalizes arguments
//! - [`ErrorLog`]: receives ephemeral failures

pub mod codec;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod manager;
pub mod registry;

pub use codec::{Codec, JsonCodec, Payload};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use identity::{AnonymousCredentials, CredentialSource, Identity, StaticCredentials};
pub use logging::{ErrorLog, TracingErrorLog};
pub use manager::{ClientSessionManager, ClientSessionManagerBuilder, EphemeralState, Pending, SessionSource};
pub use registry::{PersistentSessionProvider, SessionRegistry, SessionSlot};
pub use wamp_protocol::{CallOptions, CallResult, Kwargs, PublishOptions};
pub use wamp_runtime::{ClientSession, Credential, Endpoint, Session, SessionConfig, TransportProvider};
