//! Stream session contract
//!
//! The registry does not depacketize or decode anything itself. It routes
//! packets to a [`StreamSession`] built by a [`SessionFactory`] and only
//! reads back liveness and consumer counts.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;

use crate::rtp::Ssrc;

use super::handle::SessionEvents;

/// Error returned by a failing [`SessionFactory`]
pub type SessionError = Box<dyn std::error::Error + Send + Sync>;

/// Result of handing a packet to a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputOutcome {
    /// Whether the session consumed the packet
    pub accepted: bool,
    /// Decode timestamp produced by the session, if any
    pub dts: Option<u32>,
}

impl InputOutcome {
    /// Packet consumed, optionally producing a timestamp
    pub fn accepted(dts: Option<u32>) -> Self {
        Self {
            accepted: true,
            dts,
        }
    }

    /// Packet rejected by the session
    pub fn rejected() -> Self {
        Self::default()
    }
}

/// Per-SSRC processing unit
///
/// Implementations must be cheap to query: `is_alive` is called with the
/// registry lock held during sweeps.
pub trait StreamSession: Send + Sync + 'static {
    /// Consume one RTP packet
    fn input(&self, payload: &Bytes, from: SocketAddr) -> InputOutcome;

    /// Whether the session is still receiving data / structurally valid
    fn is_alive(&self) -> bool;

    /// Number of downstream consumers
    fn consumer_count(&self) -> u32;

    /// Receive the listener used to report close requests and
    /// zero-consumer transitions back to the registry
    ///
    /// Called once, right after the session is registered.
    fn attach(&self, events: SessionEvents) {
        let _ = events;
    }
}

/// Builds sessions for newly seen SSRCs
pub trait SessionFactory: Send + Sync + 'static {
    /// Create a session for `ssrc`
    ///
    /// Runs inside the registry's critical section, at most once per SSRC
    /// for as long as the SSRC stays registered.
    fn create(&self, ssrc: Ssrc) -> Result<Arc<dyn StreamSession>, SessionError>;
}

impl<F> SessionFactory for F
where
    F: Fn(Ssrc) -> Result<Arc<dyn StreamSession>, SessionError> + Send + Sync + 'static,
{
    fn create(&self, ssrc: Ssrc) -> Result<Arc<dyn StreamSession>, SessionError> {
        self(ssrc)
    }
}
