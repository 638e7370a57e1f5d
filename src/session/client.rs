//! Collaborator contract.
//!
//! The messaging network itself (pairing, authentication, transport) lives
//! behind [`MessagingClient`]. Lifecycle changes are announced on a
//! broadcast channel so the session manager can project readiness from them
//! without polling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::session::media::MediaError;

/// Lifecycle events raised by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A pairing code must be scanned on the phone.
    Qr(String),
    /// Credentials were accepted; the client is not usable yet.
    Authenticated,
    /// The client can serve requests.
    Ready,
    /// Stored or scanned credentials were rejected.
    AuthFailure(String),
    /// The session dropped.
    Disconnected(String),
}

impl ClientEvent {
    /// Short name used in logs and on the bridge wire.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Qr(_) => "qr",
            ClientEvent::Authenticated => "authenticated",
            ClientEvent::Ready => "ready",
            ClientEvent::AuthFailure(_) => "auth_failure",
            ClientEvent::Disconnected(_) => "disconnected",
        }
    }
}

/// Media payload ready to be sent, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub mimetype: String,
    pub data: String,
    pub filename: Option<String>,
    pub filesize: Option<u64>,
}

/// Options for [`MessagingClient::send_message`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SendOptions {
    pub caption: String,
}

/// Options for [`MediaLoader::from_url`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaOptions {
    /// Accept whatever content type the server declares when the URL gives
    /// no hint.
    pub unsafe_mime: bool,
}

/// Errors surfaced by a collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The collaborator rejected the call; the message is passed through.
    #[error("{0}")]
    Remote(String),

    /// Transport failure talking to the collaborator.
    #[error("Bridge request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Lifecycle event stream could not be opened.
    #[error("Event stream error: {0}")]
    EventStream(String),

    /// Call exceeded the configured deadline.
    #[error("Bridge call timed out after {0} seconds")]
    Timeout(u64),

    /// Collaborator misconfiguration.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Stateful messaging session.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Receive lifecycle events. Subscribe before calling `initialize`.
    fn subscribe(&self) -> broadcast::Receiver<ClientEvent>;

    /// Start the handshake. Readiness arrives later as [`ClientEvent::Ready`].
    async fn initialize(&self) -> Result<(), ClientError>;

    /// Whether `id` (`<digits>@c.us`) has an account on the network.
    async fn is_registered_user(&self, id: &str) -> Result<bool, ClientError>;

    /// Send `media` to `id`.
    async fn send_message(
        &self,
        id: &str,
        media: Media,
        options: SendOptions,
    ) -> Result<(), ClientError>;

    /// Tear down the session and its resources.
    async fn destroy(&self) -> Result<(), ClientError>;
}

/// Fetches remote media into a sendable payload.
#[async_trait]
pub trait MediaLoader: Send + Sync {
    async fn from_url(&self, url: &str, options: MediaOptions) -> Result<Media, MediaError>;
}
