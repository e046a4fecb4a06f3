//! Statistics for the stream registry

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of registry-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Sessions currently registered
    pub active_streams: u64,
    /// Sessions ever created
    pub sessions_created: u64,
    /// Sessions evicted by the idle sweep
    pub sessions_timed_out: u64,
    /// Sessions removed by a granted close request
    pub sessions_closed: u64,
    /// Removals ignored because the SSRC maps to a newer session
    pub stale_removals: u64,
    /// Packets handed to a session
    pub packets_routed: u64,
    /// Packets dropped for being shorter than the RTP header
    pub malformed_packets: u64,
    /// Packets dropped because no session exists and none was created
    pub unknown_stream_packets: u64,
}

/// Live counters behind [`RegistryStats`]
#[derive(Debug, Default)]
pub(crate) struct RegistryCounters {
    pub sessions_created: AtomicU64,
    pub sessions_timed_out: AtomicU64,
    pub sessions_closed: AtomicU64,
    pub stale_removals: AtomicU64,
    pub packets_routed: AtomicU64,
    pub malformed_packets: AtomicU64,
    pub unknown_stream_packets: AtomicU64,
}

impl RegistryCounters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self, active_streams: usize) -> RegistryStats {
        RegistryStats {
            active_streams: active_streams as u64,
            sessions_created: self.sessions_created.load(Ordering::Relaxed),
            sessions_timed_out: self.sessions_timed_out.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
            stale_removals: self.stale_removals.load(Ordering::Relaxed),
            packets_routed: self.packets_routed.load(Ordering::Relaxed),
            malformed_packets: self.malformed_packets.load(Ordering::Relaxed),
            unknown_stream_packets: self.unknown_stream_packets.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_stats_default() {
        let stats = RegistryStats::default();
        assert_eq!(stats.active_streams, 0);
        assert_eq!(stats.sessions_created, 0);
        assert_eq!(stats.packets_routed, 0);
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = RegistryCounters::default();
        RegistryCounters::incr(&counters.sessions_created);
        RegistryCounters::incr(&counters.sessions_created);
        RegistryCounters::add(&counters.sessions_timed_out, 3);
        RegistryCounters::incr(&counters.malformed_packets);

        let stats = counters.snapshot(2);
        assert_eq!(stats.active_streams, 2);
        assert_eq!(stats.sessions_created, 2);
        assert_eq!(stats.sessions_timed_out, 3);
        assert_eq!(stats.malformed_packets, 1);
        assert_eq!(stats.stale_removals, 0);
    }
}
