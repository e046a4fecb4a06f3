//! RTP ingest listener
//!
//! Receives datagrams on a single UDP socket and routes each one through the
//! stream registry.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::UdpSocket;

use crate::error::Result;
use crate::registry::{RouteError, StreamRegistry};
use crate::server::config::ServerConfig;

/// RTP ingest server
pub struct RtpServer {
    config: ServerConfig,
    socket: UdpSocket,
    registry: Arc<StreamRegistry>,
}

impl RtpServer {
    /// Bind the UDP socket
    pub async fn bind(config: ServerConfig, registry: Arc<StreamRegistry>) -> Result<Self> {
        let socket = UdpSocket::bind(config.bind_addr).await?;
        tracing::info!(addr = %socket.local_addr()?, "RTP server listening");

        Ok(Self {
            config,
            socket,
            registry,
        })
    }

    /// Get a reference to the stream registry
    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    /// Get the bound address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let sweep_handle = self
            .config
            .spawn_sweep_task
            .then(|| self.registry.spawn_sweep_task());

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.recv_loop() => result,
        };

        if let Some(handle) = sweep_handle {
            handle.abort();
        }

        result
    }

    async fn recv_loop(&self) -> Result<()> {
        let mut buf = vec![0u8; self.config.recv_buffer_size];

        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, peer)) => {
                    let packet = Bytes::copy_from_slice(&buf[..len]);
                    self.handle_datagram(packet, peer).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to receive datagram");
                }
            }
        }
    }

    async fn handle_datagram(&self, packet: Bytes, peer: SocketAddr) {
        match self.registry.route(packet, peer).await {
            Ok(outcome) if !outcome.accepted => {
                tracing::trace!(peer = %peer, "Packet rejected by session");
            }
            Ok(_) => {}
            Err(RouteError::MalformedPacket { len }) => {
                tracing::warn!(peer = %peer, len = len, "Failed to read SSRC from RTP packet");
            }
            Err(e) => {
                tracing::debug!(peer = %peer, error = %e, "Packet dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::registry::testing::{rtp_packet, MockFactory};
    use crate::rtp::Ssrc;

    async fn start() -> (
        Arc<RtpServer>,
        MockFactory,
        tokio::sync::oneshot::Sender<()>,
        tokio::task::JoinHandle<Result<()>>,
    ) {
        let factory = MockFactory::new();
        let registry = StreamRegistry::new(factory.clone());
        let config = ServerConfig::with_addr("127.0.0.1:0".parse().unwrap());
        let server = Arc::new(RtpServer::bind(config, registry).await.unwrap());

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let runner = Arc::clone(&server);
        let task = tokio::spawn(async move {
            runner
                .run_until(async {
                    let _ = rx.await;
                })
                .await
        });

        (server, factory, tx, task)
    }

    async fn wait_for_streams(server: &RtpServer, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while server.registry().len().await < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("streams not registered in time");
    }

    #[tokio::test]
    async fn test_datagrams_routed_by_ssrc() {
        let (server, factory, shutdown, task) = start().await;
        let target = server.local_addr().unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(&rtp_packet(7, 40), target).await.unwrap();
        sender.send_to(&rtp_packet(9, 40), target).await.unwrap();

        wait_for_streams(&server, 2).await;
        assert!(server.registry().contains(Ssrc(7)).await);
        assert!(server.registry().contains(Ssrc(9)).await);
        assert_eq!(factory.created(), 2);

        shutdown.send(()).unwrap();
        tokio_test::assert_ok!(task.await.unwrap());
    }

    #[tokio::test]
    async fn test_short_datagram_does_not_stop_loop() {
        let (server, _factory, shutdown, task) = start().await;
        let target = server.local_addr().unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(&[0x80, 0x60, 0x00], target).await.unwrap();
        sender.send_to(&rtp_packet(1, 0), target).await.unwrap();

        wait_for_streams(&server, 1).await;
        assert_eq!(server.registry().stats().await.malformed_packets, 1);

        shutdown.send(()).unwrap();
        tokio_test::assert_ok!(task.await.unwrap());
    }
}
