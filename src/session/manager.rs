//! Session ownership and event consumption.
//!
//! # Responsibilities
//! - Own the collaborator handle for the process lifetime
//! - Start the handshake exactly once
//! - Drive the state machine from collaborator events
//! - Expose readiness to request handlers

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::session::client::{ClientEvent, MessagingClient};
use crate::session::state::{SessionState, StateCell};

/// The process-wide messaging session.
///
/// Cheap to clone; clones share the client and the state cell.
#[derive(Clone)]
pub struct Session {
    client: Arc<dyn MessagingClient>,
    state: Arc<StateCell>,
}

impl Session {
    pub fn new(client: Arc<dyn MessagingClient>) -> Self {
        Self {
            client,
            state: Arc::new(StateCell::new()),
        }
    }

    /// True only while the collaborator reports ready.
    pub fn is_ready(&self) -> bool {
        self.state.get().is_ready()
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    pub fn client(&self) -> &Arc<dyn MessagingClient> {
        &self.client
    }

    /// Subscribe to lifecycle events and start the handshake in the
    /// background. Returns `None` if the session was already started.
    ///
    /// The returned handle is the event consumer; it ends when the client
    /// drops its event sender.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if !self.state.begin_initialize() {
            tracing::warn!("Session already initialized");
            return None;
        }

        let events = self.client.subscribe();
        let consumer = tokio::spawn(consume_events(events, self.state.clone()));

        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = client.initialize().await {
                tracing::error!(error = %e, "Client initialization failed");
            }
        });

        Some(consumer)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state.get())
            .finish()
    }
}

/// Only place session state changes after start.
async fn consume_events(mut events: broadcast::Receiver<ClientEvent>, state: Arc<StateCell>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Lifecycle events dropped");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let (previous, current) = state.apply(&event);
        log_event(&event);
        if previous != current {
            tracing::debug!(
                event = event.name(),
                from = previous.as_str(),
                to = current.as_str(),
                "Session state changed"
            );
        }
        metrics::set_session_ready(current.is_ready());
    }
    tracing::debug!("Lifecycle event stream ended");
}

fn log_event(event: &ClientEvent) {
    match event {
        ClientEvent::Qr(code) => {
            tracing::info!(qr = %code, "Scan this QR code with WhatsApp to pair the session");
            tracing::info!("Waiting for QR code scan");
        }
        ClientEvent::Authenticated => tracing::info!("WhatsApp authenticated successfully"),
        ClientEvent::Ready => tracing::info!("WhatsApp client is ready"),
        ClientEvent::AuthFailure(reason) => {
            tracing::error!(reason = %reason, "Authentication failed")
        }
        ClientEvent::Disconnected(reason) => {
            tracing::warn!(reason = %reason, "WhatsApp client disconnected")
        }
    }
}
