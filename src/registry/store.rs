//! Stream registry implementation
//!
//! The central registry that maps SSRCs to session handles, creates sessions
//! on first sight and reclaims them when they go idle or ask to be closed.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::{broadcast, RwLock};

use crate::rtp::{ssrc_from_packet, Ssrc};
use crate::stats::{RegistryCounters, RegistryStats};

use super::config::{RegistryConfig, MIN_SWEEP_INTERVAL};
use super::error::RouteError;
use super::event::{CloseReason, RegistryEvent};
use super::handle::{SessionEvents, SessionHandle};
use super::session::{InputOutcome, SessionFactory, StreamSession};

/// Central registry for all active RTP streams
///
/// Every read or write of the SSRC map goes through one `RwLock`. Session
/// logic (`input`, teardown on drop) always runs after the lock is
/// released; only `SessionFactory::create`, `StreamSession::attach` and
/// `StreamSession::is_alive` are called with the lock held.
pub struct StreamRegistry {
    /// Map of SSRC to session handle
    streams: RwLock<HashMap<Ssrc, Arc<SessionHandle>>>,

    /// Builds sessions for unseen SSRCs
    factory: Box<dyn SessionFactory>,

    /// Configuration
    config: RegistryConfig,

    /// Back-reference handed to new handles
    this: Weak<StreamRegistry>,

    /// Reference point for `last_sweep_ms`
    epoch: Instant,

    /// Milliseconds since `epoch` at the last idle sweep
    last_sweep_ms: AtomicU64,

    /// Lifecycle event fan-out
    events: broadcast::Sender<RegistryEvent>,

    counters: RegistryCounters,
}

impl StreamRegistry {
    /// Create a new registry with default configuration
    pub fn new(factory: impl SessionFactory) -> Arc<Self> {
        Self::with_config(factory, RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(factory: impl SessionFactory, config: RegistryConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        Arc::new_cyclic(|this| Self {
            streams: RwLock::new(HashMap::new()),
            factory: Box::new(factory),
            config,
            this: this.clone(),
            epoch: Instant::now(),
            last_sweep_ms: AtomicU64::new(0),
            events,
            counters: RegistryCounters::default(),
        })
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Route an RTP packet, creating a session for a new SSRC
    ///
    /// Returns the session's input outcome. Packets shorter than the RTP
    /// fixed header are rejected before any lookup.
    pub async fn route(&self, payload: Bytes, from: SocketAddr) -> Result<InputOutcome, RouteError> {
        self.dispatch(payload, from, true).await
    }

    /// Route an RTP packet only if its SSRC already has a session
    pub async fn route_existing(
        &self,
        payload: Bytes,
        from: SocketAddr,
    ) -> Result<InputOutcome, RouteError> {
        self.dispatch(payload, from, false).await
    }

    async fn dispatch(
        &self,
        payload: Bytes,
        from: SocketAddr,
        create_if_absent: bool,
    ) -> Result<InputOutcome, RouteError> {
        let Some(ssrc) = ssrc_from_packet(&payload) else {
            RegistryCounters::incr(&self.counters.malformed_packets);
            tracing::debug!(len = payload.len(), peer = %from, "Dropping short RTP packet");
            return Err(RouteError::MalformedPacket { len: payload.len() });
        };

        self.maybe_sweep().await;

        let handle = match self.resolve(ssrc, create_if_absent).await? {
            Some(handle) => handle,
            None => {
                RegistryCounters::incr(&self.counters.unknown_stream_packets);
                tracing::debug!(ssrc = %ssrc, peer = %from, "No session for SSRC");
                return Err(RouteError::UnknownStream(ssrc));
            }
        };

        let outcome = handle.session().input(&payload, from);
        RegistryCounters::incr(&self.counters.packets_routed);

        Ok(outcome)
    }

    /// Look up the handle for an SSRC, optionally creating it
    ///
    /// Lookup and creation happen in one write-locked step, so concurrent
    /// first packets for the same SSRC construct exactly one session.
    pub async fn resolve(
        &self,
        ssrc: Ssrc,
        create_if_absent: bool,
    ) -> Result<Option<Arc<SessionHandle>>, RouteError> {
        if let Some(handle) = self.get(ssrc).await {
            return Ok(Some(handle));
        }
        if !create_if_absent {
            return Ok(None);
        }

        let mut streams = self.streams.write().await;

        // Another packet may have created it between the two locks
        if let Some(handle) = streams.get(&ssrc) {
            return Ok(Some(Arc::clone(handle)));
        }

        let session = self
            .factory
            .create(ssrc)
            .map_err(|source| RouteError::SessionCreation { ssrc, source })?;

        let handle = Arc::new(SessionHandle::new(ssrc, session, self.this.clone()));
        handle
            .session()
            .attach(SessionEvents::new(ssrc, Arc::downgrade(&handle)));

        streams.insert(ssrc, Arc::clone(&handle));

        // Published under the lock so subscribers see lifecycle events per
        // SSRC in the order the map changed
        RegistryCounters::incr(&self.counters.sessions_created);
        tracing::info!(ssrc = %ssrc, active_streams = streams.len(), "Session created");
        self.publish(RegistryEvent::SessionCreated(ssrc));
        drop(streams);

        Ok(Some(handle))
    }

    /// Get the handle for an SSRC without creating one
    pub async fn get(&self, ssrc: Ssrc) -> Option<Arc<SessionHandle>> {
        self.streams.read().await.get(&ssrc).cloned()
    }

    /// Check if an SSRC has a session
    pub async fn contains(&self, ssrc: Ssrc) -> bool {
        self.streams.read().await.contains_key(&ssrc)
    }

    /// Remove the entry for `ssrc` if it still holds `candidate`
    ///
    /// Returns false if the SSRC is unknown or maps to another session
    /// instance (it was evicted and recreated in the meantime).
    pub async fn remove(&self, ssrc: Ssrc, candidate: &Arc<dyn StreamSession>) -> bool {
        self.remove_session(ssrc, candidate, CloseReason::Removed).await
    }

    pub(super) async fn remove_session(
        &self,
        ssrc: Ssrc,
        candidate: &Arc<dyn StreamSession>,
        reason: CloseReason,
    ) -> bool {
        let removed = {
            let mut streams = self.streams.write().await;

            let is_current = streams
                .get(&ssrc)
                .map(|current| Arc::ptr_eq(current.session(), candidate));

            match is_current {
                None => {
                    tracing::debug!(ssrc = %ssrc, "Removal for unknown SSRC");
                    return false;
                }
                Some(false) => {
                    RegistryCounters::incr(&self.counters.stale_removals);
                    tracing::debug!(ssrc = %ssrc, "Ignoring removal of replaced session");
                    return false;
                }
                Some(true) => {}
            }

            let removed = streams.remove(&ssrc);
            if let Some(handle) = &removed {
                RegistryCounters::incr(&self.counters.sessions_closed);
                tracing::info!(
                    ssrc = %ssrc,
                    reason = ?reason,
                    lifetime_ms = handle.created_at().elapsed().as_millis() as u64,
                    "Session closed"
                );
                self.publish(RegistryEvent::SessionClosed { ssrc, reason });
            }
            removed
        };

        // Handle (and possibly the session) is dropped outside the lock
        drop(removed);
        true
    }

    /// Evict every session that reports itself not alive
    ///
    /// Returns the number of evicted sessions.
    pub async fn sweep(&self) -> usize {
        let mut evicted = Vec::new();
        {
            let mut streams = self.streams.write().await;
            streams.retain(|_, handle| {
                if handle.is_alive() {
                    true
                } else {
                    evicted.push(Arc::clone(handle));
                    false
                }
            });

            RegistryCounters::add(&self.counters.sessions_timed_out, evicted.len() as u64);
            for handle in &evicted {
                tracing::warn!(ssrc = %handle.ssrc(), "Session timed out");
                self.publish(RegistryEvent::SessionClosed {
                    ssrc: handle.ssrc(),
                    reason: CloseReason::Timeout,
                });
            }
        }

        // Evicted handles are dropped outside the lock
        evicted.len()
    }

    /// Run the idle sweep if `sweep_interval` has elapsed since the last one
    ///
    /// Called on every routed packet. When several packets race past the
    /// interval, only one of them performs the sweep.
    pub async fn maybe_sweep(&self) -> bool {
        let now_ms = self.epoch.elapsed().as_millis() as u64;
        let last_ms = self.last_sweep_ms.load(Ordering::Acquire);
        let interval_ms = self.config.sweep_interval.as_millis() as u64;

        if now_ms.saturating_sub(last_ms) <= interval_ms {
            return false;
        }

        if self
            .last_sweep_ms
            .compare_exchange(last_ms, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        self.sweep().await;
        true
    }

    /// Spawn a background sweep task
    ///
    /// For deployments that need idle streams reclaimed without waiting for
    /// traffic. The task holds a `Weak` reference and exits once the
    /// registry is dropped. Returns a handle that can be used to abort it.
    pub fn spawn_sweep_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::downgrade(self);
        // The config fields are public, so the setter clamp can be bypassed
        let interval = self.config.sweep_interval.max(MIN_SWEEP_INTERVAL);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                let now_ms = registry.epoch.elapsed().as_millis() as u64;
                registry.last_sweep_ms.store(now_ms, Ordering::Release);
                registry.sweep().await;
            }
        })
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe_events(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub(super) fn publish(&self, event: RegistryEvent) {
        // Err only means nobody is listening
        let _ = self.events.send(event);
    }

    /// SSRCs currently registered
    pub async fn ssrcs(&self) -> Vec<Ssrc> {
        self.streams.read().await.keys().copied().collect()
    }

    /// Get total number of sessions
    pub async fn len(&self) -> usize {
        self.streams.read().await.len()
    }

    /// Check if no session is registered
    pub async fn is_empty(&self) -> bool {
        self.streams.read().await.is_empty()
    }

    /// Get registry statistics
    pub async fn stats(&self) -> RegistryStats {
        let active = self.len().await;
        self.counters.snapshot(active)
    }
}

impl std::fmt::Debug for StreamRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRegistry")
            .field("config", &self.config)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}
