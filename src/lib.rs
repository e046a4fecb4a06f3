//! SSRC-keyed RTP ingest for media relays
//!
//! Accepts RTP packets from many senders on one UDP endpoint, identifies the
//! stream of each packet by its SSRC and routes it to a per-stream session.
//! Sessions are created on the first packet of an SSRC and reclaimed when
//! they go idle or when the distribution side asks for them to be closed.
//!
//! Depacketization, decoding and fan-out to consumers belong to the session
//! implementation plugged in through [`SessionFactory`].
//!
//! # Example
//!
//! ```no_run
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use rtp_ingest::{
//!     InputOutcome, RtpServer, ServerConfig, SessionError, Ssrc, StreamRegistry, StreamSession,
//! };
//!
//! struct NullSession;
//!
//! impl StreamSession for NullSession {
//!     fn input(&self, _payload: &Bytes, _from: SocketAddr) -> InputOutcome {
//!         InputOutcome::accepted(None)
//!     }
//!     fn is_alive(&self) -> bool {
//!         true
//!     }
//!     fn consumer_count(&self) -> u32 {
//!         0
//!     }
//! }
//!
//! fn create(_ssrc: Ssrc) -> Result<Arc<dyn StreamSession>, SessionError> {
//!     Ok(Arc::new(NullSession))
//! }
//!
//! # async fn run() -> rtp_ingest::Result<()> {
//! let registry = StreamRegistry::new(create);
//! let server = RtpServer::bind(ServerConfig::default(), registry).await?;
//! server.run().await
//! # }
//! ```

pub mod error;
pub mod registry;
pub mod rtp;
pub mod server;
pub mod stats;

pub use error::{Error, Result};
pub use registry::{
    CloseDecision, CloseReason, InputOutcome, RegistryConfig, RegistryEvent, RouteError,
    SessionError, SessionEvents, SessionFactory, SessionHandle, StreamRegistry, StreamSession,
};
pub use rtp::Ssrc;
pub use server::{RtpServer, ServerConfig};
pub use stats::RegistryStats;
