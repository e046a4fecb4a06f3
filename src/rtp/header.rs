//! SSRC extraction from the RTP fixed header
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|X|  CC   |M|     PT      |       sequence number         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           synchronization source (SSRC) identifier            |
//! +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! ```
//!
//! No other header field is validated. The SSRC is a routing key only.

use bytes::Buf;

/// Size of the RTP fixed header (without CSRC list or extensions)
pub const RTP_HEADER_MIN_LEN: usize = 12;

/// Byte offset of the SSRC field
pub const SSRC_OFFSET: usize = 8;

/// RTP synchronization source identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ssrc(pub u32);

impl Ssrc {
    /// Raw 32-bit value
    pub fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for Ssrc {
    fn from(value: u32) -> Self {
        Ssrc(value)
    }
}

impl std::fmt::Display for Ssrc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

/// Read the SSRC (network byte order) from a raw RTP packet
///
/// Returns `None` if the packet is shorter than the fixed header.
pub fn ssrc_from_packet(packet: &[u8]) -> Option<Ssrc> {
    if packet.len() < RTP_HEADER_MIN_LEN {
        return None;
    }

    let mut field = &packet[SSRC_OFFSET..SSRC_OFFSET + 4];
    Some(Ssrc(field.get_u32()))
}
