//! Registry error types
//!
//! Error types for packet routing and session lookup.

use crate::rtp::Ssrc;

use super::session::SessionError;

/// Error type for registry operations
///
/// All variants are per-packet and non-fatal.
#[derive(Debug)]
pub enum RouteError {
    /// Packet too short to carry an SSRC
    MalformedPacket {
        /// Length of the rejected payload
        len: usize,
    },
    /// No session exists for the SSRC and creation was not requested
    UnknownStream(Ssrc),
    /// The session factory failed to build a session
    SessionCreation {
        /// SSRC the session was being created for
        ssrc: Ssrc,
        /// Underlying factory error
        source: SessionError,
    },
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteError::MalformedPacket { len } => {
                write!(f, "Malformed RTP packet: {} bytes", len)
            }
            RouteError::UnknownStream(ssrc) => write!(f, "Unknown stream: {}", ssrc),
            RouteError::SessionCreation { ssrc, source } => {
                write!(f, "Failed to create session for {}: {}", ssrc, source)
            }
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::SessionCreation { source, .. } => Some(&**source),
            _ => None,
        }
    }
}
