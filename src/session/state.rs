//! Session state machine.
//!
//! # States
//! - Uninitialized: client constructed, handshake not started
//! - Initializing: handshake running (may be waiting on a QR scan)
//! - Authenticated: credentials accepted, not usable yet
//! - Ready: requests may be served
//! - Disconnected: session dropped after having been live
//! - AuthFailed: credentials rejected
//!
//! # State Transitions
//! ```text
//! Uninitialized → Initializing: initialize()
//! * → Authenticated: "authenticated" (Ready stays Ready)
//! * → Ready: "ready"
//! * → AuthFailed: "auth_failure"
//! * → Disconnected: "disconnected"
//! ```
//!
//! # Design Decisions
//! - Readiness is a projection: true only in `Ready`
//! - No reconnect loop; a later "ready" is the only way back
//! - Stored in an atomic so handlers read it without locking

use std::sync::atomic::{AtomicU8, Ordering};

use crate::session::client::ClientEvent;

/// Lifecycle state of the collaborator session.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized = 0,
    Initializing = 1,
    Authenticated = 2,
    Ready = 3,
    Disconnected = 4,
    AuthFailed = 5,
}

impl From<u8> for SessionState {
    fn from(val: u8) -> Self {
        match val {
            1 => SessionState::Initializing,
            2 => SessionState::Authenticated,
            3 => SessionState::Ready,
            4 => SessionState::Disconnected,
            5 => SessionState::AuthFailed,
            _ => SessionState::Uninitialized,
        }
    }
}

impl SessionState {
    /// State after `event` is observed in `self`.
    pub fn on_event(self, event: &ClientEvent) -> SessionState {
        match event {
            ClientEvent::Qr(_) => self,
            ClientEvent::Authenticated if self == SessionState::Ready => self,
            ClientEvent::Authenticated => SessionState::Authenticated,
            ClientEvent::Ready => SessionState::Ready,
            ClientEvent::AuthFailure(_) => SessionState::AuthFailed,
            ClientEvent::Disconnected(_) => SessionState::Disconnected,
        }
    }

    pub fn is_ready(self) -> bool {
        self == SessionState::Ready
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initializing => "initializing",
            SessionState::Authenticated => "authenticated",
            SessionState::Ready => "ready",
            SessionState::Disconnected => "disconnected",
            SessionState::AuthFailed => "auth_failed",
        }
    }
}

/// Shared cell holding the current [`SessionState`].
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(SessionState::Uninitialized as u8))
    }

    pub fn get(&self) -> SessionState {
        SessionState::from(self.0.load(Ordering::Acquire))
    }

    /// Move `Uninitialized → Initializing`. Returns false if the handshake
    /// was already started.
    pub fn begin_initialize(&self) -> bool {
        self.0
            .compare_exchange(
                SessionState::Uninitialized as u8,
                SessionState::Initializing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Apply `event` and return `(previous, current)`.
    pub fn apply(&self, event: &ClientEvent) -> (SessionState, SessionState) {
        let previous = self.get();
        let next = previous.on_event(event);
        self.0.store(next as u8, Ordering::Release);
        (previous, next)
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
