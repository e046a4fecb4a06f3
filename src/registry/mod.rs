//! SSRC-keyed session registry
//!
//! The registry maps RTP SSRCs to per-stream sessions. Sessions are created
//! on the first packet for an SSRC and reclaimed either by the idle sweep or
//! by a close request coming from the distribution side.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<StreamRegistry>
//!                     ┌─────────────────────────┐
//!   UDP datagram ───► │ streams: HashMap<Ssrc,  │
//!   route()           │   Arc<SessionHandle> {  │
//!                     │     session,            │
//!                     │     registry: Weak ─────┼──┐
//!                     │   }                     │  │
//!                     │ >                       │◄─┘ remove(ssrc, &session)
//!                     └───────────┬─────────────┘
//!                                 │ input()
//!                                 ▼
//!                        dyn StreamSession ── SessionEvents (Weak<SessionHandle>)
//!                                                │
//!                                                └──► request_close(force)
//! ```
//!
//! # Removal races
//!
//! Two independent triggers remove entries: the idle sweep and close
//! requests. A close request always presents the session instance it was
//! issued for, and the registry only erases the entry if it still holds
//! that exact instance. A delayed close therefore never removes a session
//! that replaced the original after a sweep.

pub mod config;
pub mod error;
pub mod event;
pub mod handle;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RegistryConfig;
pub use error::RouteError;
pub use event::{CloseReason, RegistryEvent};
pub use handle::{CloseDecision, SessionEvents, SessionHandle};
pub use session::{InputOutcome, SessionError, SessionFactory, StreamSession};
pub use store::StreamRegistry;
