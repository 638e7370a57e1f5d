//! Messaging session subsystem.
//!
//! # Data Flow
//! ```text
//! startup
//!     → manager.rs (Session::start: subscribe, then initialize)
//!     → client.rs  (MessagingClient handshake, events on a broadcast channel)
//!     → state.rs   (transition per event, readiness projection)
//!     → handlers read Session::is_ready() before every collaborator call
//!
//! send-image:
//!     media.rs (MediaLoader::from_url) → client.rs (send_message)
//! ```
//!
//! # Design Decisions
//! - The collaborator is a trait object so tests and alternative bridges plug in
//! - State changes only from the event consumer task
//! - bridge.rs is the production collaborator; it speaks HTTP + WebSocket

pub mod bridge;
pub mod client;
pub mod manager;
pub mod media;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::BridgeClient;
pub use client::{
    ClientError, ClientEvent, Media, MediaLoader, MediaOptions, MessagingClient, SendOptions,
};
pub use manager::Session;
pub use media::{HttpMediaLoader, MediaError};
pub use state::SessionState;
