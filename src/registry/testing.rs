//! Mock sessions for registry tests

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::rtp::Ssrc;

use super::handle::SessionEvents;
use super::session::{InputOutcome, SessionError, SessionFactory, StreamSession};

pub(crate) struct MockSession {
    pub ssrc: Ssrc,
    alive: AtomicBool,
    consumers: AtomicU32,
    packets: AtomicU64,
    last_len: AtomicUsize,
    events: Mutex<Option<SessionEvents>>,
}

impl MockSession {
    fn new(ssrc: Ssrc) -> Self {
        Self {
            ssrc,
            alive: AtomicBool::new(true),
            consumers: AtomicU32::new(0),
            packets: AtomicU64::new(0),
            last_len: AtomicUsize::new(0),
            events: Mutex::new(None),
        }
    }

    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }

    pub fn set_consumers(&self, count: u32) {
        self.consumers.store(count, Ordering::SeqCst);
    }

    pub fn packets(&self) -> u64 {
        self.packets.load(Ordering::SeqCst)
    }

    pub fn last_len(&self) -> usize {
        self.last_len.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Option<SessionEvents> {
        self.events.lock().unwrap().clone()
    }
}

impl StreamSession for MockSession {
    fn input(&self, payload: &Bytes, _from: SocketAddr) -> InputOutcome {
        let count = self.packets.fetch_add(1, Ordering::SeqCst) + 1;
        self.last_len.store(payload.len(), Ordering::SeqCst);
        InputOutcome::accepted(Some(count as u32 * 90))
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn consumer_count(&self) -> u32 {
        self.consumers.load(Ordering::SeqCst)
    }

    fn attach(&self, events: SessionEvents) {
        *self.events.lock().unwrap() = Some(events);
    }
}

#[derive(Default)]
struct FactoryState {
    created: AtomicUsize,
    sessions: Mutex<Vec<Arc<MockSession>>>,
    fail: AtomicBool,
    born_dead: AtomicBool,
}

/// Records every session it builds, in creation order
#[derive(Clone, Default)]
pub(crate) struct MockFactory {
    state: Arc<FactoryState>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.state.created.load(Ordering::SeqCst)
    }

    pub fn session(&self, index: usize) -> Arc<MockSession> {
        Arc::clone(&self.state.sessions.lock().unwrap()[index])
    }

    pub fn set_failing(&self, fail: bool) {
        self.state.fail.store(fail, Ordering::SeqCst);
    }

    /// New sessions report not-alive from the start
    pub fn set_born_dead(&self, dead: bool) {
        self.state.born_dead.store(dead, Ordering::SeqCst);
    }
}

impl SessionFactory for MockFactory {
    fn create(&self, ssrc: Ssrc) -> Result<Arc<dyn StreamSession>, SessionError> {
        if self.state.fail.load(Ordering::SeqCst) {
            return Err("mock factory failure".into());
        }

        self.state.created.fetch_add(1, Ordering::SeqCst);
        let session = Arc::new(MockSession::new(ssrc));
        if self.state.born_dead.load(Ordering::SeqCst) {
            session.set_alive(false);
        }
        self.state.sessions.lock().unwrap().push(Arc::clone(&session));
        Ok(session)
    }
}

pub(crate) fn rtp_packet(ssrc: u32, payload_len: usize) -> Bytes {
    let mut buf = vec![0x80, 0x60, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
    buf.extend_from_slice(&ssrc.to_be_bytes());
    buf.resize(12 + payload_len, 0);
    Bytes::from(buf)
}

pub(crate) fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}
