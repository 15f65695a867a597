//! WAMP Runtime - Client sessions, request correlation, and transport seams
//!
//! This crate provides the session-level machinery a WAMP caller and
//! publisher needs once a connection to a router exists:
//!
//! - **Transport**: Object-safe sending/receiving halves behind a provider
//! - **Session**: Hello/Challenge/Welcome handshake and the dispatch loop
//! - **Correlator**: Request ids and pending result sinks
//! - **Auth**: WAMP-CRA challenge signing
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   wamp-rs    │  Session manager (persistent vs. ephemeral)
//! └──────┬───────┘
//!        │ opens connections through TransportProvider
//! ┌──────▼───────┐
//! │ wamp-runtime │  This crate
//! │  ┌────────┐  │
//! │  │Session │  │  Handshake + dispatch
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Corr.  │  │  Request/reply correlation
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Trans  │  │  Transport seam (in-memory included)
//! │  └────────┘  │
//! └──────────────┘
//! ```

pub mod auth;
pub mod correlator;
pub mod error;
pub mod session;
pub mod transport;

// Re-export key types at crate root
pub use auth::{ClientAuthenticator, Credential, WampCraAuthenticator};
pub use correlator::{PendingRequest, Reply, RequestCorrelator, ResponseFuture};
pub use error::{Error, Result};
pub use session::{ClientSession, Session, SessionConfig, SessionState};
pub use transport::{Endpoint, Transport, TransportParts, TransportProvider, TransportReceiver};
