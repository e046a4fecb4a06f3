//! Server configuration

use std::net::SocketAddr;

/// Default UDP port for RTP ingest
pub const DEFAULT_RTP_PORT: u16 = 10000;

/// Largest UDP payload
pub const MAX_DATAGRAM_SIZE: usize = 65535;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Receive buffer size; longer datagrams are truncated by the OS
    pub recv_buffer_size: usize,

    /// Run the idle sweep on a timer in addition to the traffic-driven one
    pub spawn_sweep_task: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_RTP_PORT)),
            recv_buffer_size: MAX_DATAGRAM_SIZE,
            spawn_sweep_task: false,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the receive buffer size
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size.clamp(crate::rtp::RTP_HEADER_MIN_LEN, MAX_DATAGRAM_SIZE);
        self
    }

    /// Enable the timer-driven sweep task
    pub fn with_sweep_task(mut self) -> Self {
        self.spawn_sweep_task = true;
        self
    }
}
