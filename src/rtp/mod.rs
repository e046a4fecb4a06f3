//! RTP wire handling
//!
//! The registry only needs one field out of the RTP fixed header: the
//! synchronization source identifier (SSRC) used as the routing key.

pub mod header;

pub use header::{ssrc_from_packet, Ssrc, RTP_HEADER_MIN_LEN, SSRC_OFFSET};
