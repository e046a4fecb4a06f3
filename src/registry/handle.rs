//! Session handle
//!
//! One handle per registered SSRC. The handle owns the session and turns the
//! session's close / zero-consumer notifications into identity-checked
//! requests against the registry. It only keeps a `Weak` reference to the
//! registry, so the registry owns handles and never the other way round.

use std::sync::{Arc, Weak};
use std::time::Instant;

use crate::rtp::Ssrc;

use super::event::{CloseReason, RegistryEvent};
use super::session::StreamSession;
use super::store::StreamRegistry;

/// Outcome of a close request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// The session was removed from the registry
    Granted,
    /// Graceful close refused: the session still has consumers
    ConsumersRemain,
    /// The registry has already been dropped
    RegistryGone,
    /// The SSRC is gone or now maps to a different session
    Stale,
}

impl CloseDecision {
    /// Whether the session was removed
    pub fn is_granted(self) -> bool {
        self == CloseDecision::Granted
    }
}

/// Registry entry wrapping one stream session
pub struct SessionHandle {
    ssrc: Ssrc,
    session: Arc<dyn StreamSession>,
    registry: Weak<StreamRegistry>,
    created_at: Instant,
}

impl SessionHandle {
    pub(super) fn new(
        ssrc: Ssrc,
        session: Arc<dyn StreamSession>,
        registry: Weak<StreamRegistry>,
    ) -> Self {
        Self {
            ssrc,
            session,
            registry,
            created_at: Instant::now(),
        }
    }

    /// SSRC this handle was created for
    pub fn ssrc(&self) -> Ssrc {
        self.ssrc
    }

    /// The owned session instance
    pub fn session(&self) -> &Arc<dyn StreamSession> {
        &self.session
    }

    /// When the session was created
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Number of consumers reported by the session
    pub fn consumer_count(&self) -> u32 {
        self.session.consumer_count()
    }

    /// Whether the session reports itself alive
    pub fn is_alive(&self) -> bool {
        self.session.is_alive()
    }

    /// Ask the registry to drop this session
    ///
    /// Safe to call from any task. Without `force`, the request is refused
    /// while the session has consumers. The registry only removes the entry
    /// if it still maps to this handle's session instance.
    pub async fn request_close(&self, force: bool) -> CloseDecision {
        if !force {
            let consumers = self.session.consumer_count();
            if consumers > 0 {
                tracing::debug!(
                    ssrc = %self.ssrc,
                    consumers = consumers,
                    "Close request denied: consumers remain"
                );
                return CloseDecision::ConsumersRemain;
            }
        }

        let Some(registry) = self.registry.upgrade() else {
            return CloseDecision::RegistryGone;
        };

        let reason = CloseReason::Requested { force };
        if registry.remove_session(self.ssrc, &self.session, reason).await {
            CloseDecision::Granted
        } else {
            CloseDecision::Stale
        }
    }

    /// Close notification from the distribution layer
    ///
    /// Returns whether the close was granted.
    pub async fn on_close_requested(&self, force: bool) -> bool {
        self.request_close(force).await.is_granted()
    }

    /// Zero-consumer notification from the distribution layer
    ///
    /// Publishes [`RegistryEvent::NoConsumers`] if the session really has no
    /// consumers left; listeners decide whether to request a close.
    pub fn on_no_consumers(&self) {
        if self.session.consumer_count() > 0 {
            return;
        }

        if let Some(registry) = self.registry.upgrade() {
            tracing::debug!(ssrc = %self.ssrc, "Session has no consumers");
            registry.publish(RegistryEvent::NoConsumers(self.ssrc));
        }
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("ssrc", &self.ssrc)
            .field("consumers", &self.session.consumer_count())
            .field("alive", &self.session.is_alive())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Listener handed to a session via [`StreamSession::attach`]
///
/// Holds a `Weak` reference to the handle: the handle owns the session, so
/// the session must not own the handle.
#[derive(Clone)]
pub struct SessionEvents {
    ssrc: Ssrc,
    handle: Weak<SessionHandle>,
}

impl SessionEvents {
    pub(super) fn new(ssrc: Ssrc, handle: Weak<SessionHandle>) -> Self {
        Self { ssrc, handle }
    }

    /// SSRC of the session this listener belongs to
    pub fn ssrc(&self) -> Ssrc {
        self.ssrc
    }

    /// Whether the handle is still registered or held somewhere
    pub fn is_attached(&self) -> bool {
        self.handle.strong_count() > 0
    }

    /// Request removal of the session; `false` if the handle is gone
    pub async fn request_close(&self, force: bool) -> bool {
        match self.handle.upgrade() {
            Some(handle) => handle.on_close_requested(force).await,
            None => false,
        }
    }

    /// Report that the session's consumer count dropped to zero
    pub fn no_consumers(&self) {
        if let Some(handle) = self.handle.upgrade() {
            handle.on_no_consumers();
        }
    }
}

impl std::fmt::Debug for SessionEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEvents")
            .field("ssrc", &self.ssrc)
            .field("attached", &self.is_attached())
            .finish()
    }
}
