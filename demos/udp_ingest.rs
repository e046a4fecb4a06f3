//! UDP RTP ingest example
//!
//! Run with: cargo run --example udp_ingest [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example udp_ingest                    # binds to 0.0.0.0:10000
//!   cargo run --example udp_ingest localhost          # binds to 127.0.0.1:10000
//!   cargo run --example udp_ingest 127.0.0.1:5004     # binds to 127.0.0.1:5004
//!
//! ## Sending RTP
//!
//! With ffmpeg:
//!   ffmpeg -re -i input.mp4 -an -c:v copy -f rtp -ssrc 7 rtp://127.0.0.1:10000
//!
//! Every distinct SSRC gets its own session. A session that receives nothing
//! for 15 seconds is evicted on the next sweep.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::broadcast::{self, error::RecvError};
use rtp_ingest::{
    InputOutcome, RegistryEvent, RtpServer, ServerConfig, SessionError, Ssrc, StreamRegistry,
    StreamSession,
};

const SESSION_TIMEOUT: Duration = Duration::from_secs(15);

/// Session that only counts packets and tracks the RTP timestamp
struct CountingSession {
    ssrc: Ssrc,
    packets: AtomicU64,
    bytes: AtomicU64,
    last_packet_at: Mutex<Instant>,
}

impl CountingSession {
    fn new(ssrc: Ssrc) -> Self {
        Self {
            ssrc,
            packets: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            last_packet_at: Mutex::new(Instant::now()),
        }
    }
}

impl StreamSession for CountingSession {
    fn input(&self, payload: &Bytes, from: SocketAddr) -> InputOutcome {
        let count = self.packets.fetch_add(1, Ordering::Relaxed) + 1;
        self.bytes.fetch_add(payload.len() as u64, Ordering::Relaxed);
        if let Ok(mut last) = self.last_packet_at.lock() {
            *last = Instant::now();
        }

        if count % 500 == 0 {
            tracing::debug!(
                ssrc = %self.ssrc,
                peer = %from,
                packets = count,
                bytes = self.bytes.load(Ordering::Relaxed),
                "Stream progress"
            );
        }

        let timestamp = u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);
        InputOutcome::accepted(Some(timestamp))
    }

    fn is_alive(&self) -> bool {
        self.last_packet_at
            .lock()
            .map(|last| last.elapsed() < SESSION_TIMEOUT)
            .unwrap_or(false)
    }

    fn consumer_count(&self) -> u32 {
        0
    }
}

fn create_session(ssrc: Ssrc) -> Result<Arc<dyn StreamSession>, SessionError> {
    Ok(Arc::new(CountingSession::new(ssrc)))
}

/// Parse bind address from command line argument.
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 10000;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

/// Print lifecycle events until the registry is dropped
///
/// Returns the number of events printed.
async fn log_events(mut events: broadcast::Receiver<RegistryEvent>) -> usize {
    let mut printed = 0;
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped = skipped, "Event log lagged");
                continue;
            }
            Err(RecvError::Closed) => return printed,
        };

        match event {
            RegistryEvent::SessionCreated(ssrc) => println!("+ stream {}", ssrc),
            RegistryEvent::SessionClosed { ssrc, reason } => {
                println!("- stream {} ({:?})", ssrc, reason)
            }
            RegistryEvent::NoConsumers(ssrc) => println!("  stream {} has no consumers", ssrc),
        }
        printed += 1;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    let mut config = ServerConfig::default();
    if let Some(arg) = args.get(1) {
        config = config.bind(parse_bind_addr(arg)?);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rtp_ingest=debug".parse()?)
                .add_directive("udp_ingest=debug".parse()?),
        )
        .init();

    let registry = StreamRegistry::new(create_session);

    let events = tokio::spawn(log_events(registry.subscribe_events()));

    let server = RtpServer::bind(config, Arc::clone(&registry)).await?;
    println!("Listening for RTP on {}", server.local_addr()?);

    let mut report = tokio::time::interval(Duration::from_secs(10));
    let stats_registry = Arc::clone(&registry);
    let reporter = tokio::spawn(async move {
        loop {
            report.tick().await;
            let stats = stats_registry.stats().await;
            println!(
                "Stats: streams={} created={} timed_out={} routed={} malformed={}",
                stats.active_streams,
                stats.sessions_created,
                stats.sessions_timed_out,
                stats.packets_routed,
                stats.malformed_packets,
            );
        }
    });

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    reporter.abort();
    events.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtp_ingest::RegistryConfig;

    #[tokio::test]
    async fn test_event_log_survives_lag() {
        let config = RegistryConfig::default().event_capacity(1);
        let registry = StreamRegistry::with_config(create_session, config);
        let events = registry.subscribe_events();

        for ssrc in 1..=3 {
            registry.resolve(Ssrc(ssrc), true).await.unwrap();
        }
        drop(registry);

        // Two events were overwritten; the newest one is still printed
        assert_eq!(log_events(events).await, 1);
    }
}
