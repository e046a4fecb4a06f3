//! Registry lifecycle events
//!
//! Published on a `tokio::sync::broadcast` channel so the distribution
//! layer can react (e.g. decide to request a close after `NoConsumers`).

use crate::rtp::Ssrc;

/// Why a session left the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Evicted by the idle sweep
    Timeout,
    /// Removed by a granted close request
    Requested {
        /// Whether the consumer check was bypassed
        force: bool,
    },
    /// Removed directly through `StreamRegistry::remove`
    Removed,
}

/// Lifecycle notification emitted by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A session was created for a previously unseen SSRC
    SessionCreated(Ssrc),
    /// A session dropped to zero consumers
    NoConsumers(Ssrc),
    /// A session was removed from the registry
    SessionClosed {
        /// SSRC of the removed session
        ssrc: Ssrc,
        /// Removal trigger
        reason: CloseReason,
    },
}

impl RegistryEvent {
    /// SSRC the event refers to
    pub fn ssrc(&self) -> Ssrc {
        match self {
            RegistryEvent::SessionCreated(ssrc) | RegistryEvent::NoConsumers(ssrc) => *ssrc,
            RegistryEvent::SessionClosed { ssrc, .. } => *ssrc,
        }
    }
}
