//! Browser-automation bridge client.
//!
//! # Responsibilities
//! - Start a named session on the bridge (auth profile keyed by client id)
//! - Relay lifecycle events from the bridge's WebSocket feed
//! - Forward registration checks, sends and teardown as HTTP calls
//!
//! # Data Flow
//! ```text
//! initialize():
//!     ws  GET  /sessions/{id}/events  → pump task → broadcast<ClientEvent>
//!     POST /sessions/{id}             → handshake starts on the bridge
//!
//! is_registered_user():  GET    /sessions/{id}/contacts/{user}/registered
//! send_message():        POST   /sessions/{id}/messages
//! destroy():             DELETE /sessions/{id}
//! ```
//!
//! # Design Decisions
//! - Event feed is opened before the handshake so no event is missed
//! - A feed that ends while the session is live is reported as a disconnect
//! - Calls have no deadline unless `request_timeout_secs` is set

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::config::SessionConfig;
use crate::resilience::timeouts::race_deadline;
use crate::session::client::{ClientError, ClientEvent, Media, MessagingClient, SendOptions};

type EventStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Event frame as sent by the bridge.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum WireEvent {
    Qr {
        qr: String,
    },
    Authenticated,
    Ready,
    AuthFailure {
        #[serde(default)]
        message: String,
    },
    Disconnected {
        #[serde(default)]
        reason: String,
    },
}

impl From<WireEvent> for ClientEvent {
    fn from(event: WireEvent) -> Self {
        match event {
            WireEvent::Qr { qr } => ClientEvent::Qr(qr),
            WireEvent::Authenticated => ClientEvent::Authenticated,
            WireEvent::Ready => ClientEvent::Ready,
            WireEvent::AuthFailure { message } => ClientEvent::AuthFailure(message),
            WireEvent::Disconnected { reason } => ClientEvent::Disconnected(reason),
        }
    }
}

fn parse_event(text: &str) -> Result<ClientEvent, serde_json::Error> {
    serde_json::from_str::<WireEvent>(text).map(ClientEvent::from)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartSession<'a> {
    client_id: &'a str,
    puppeteer: BrowserOptions<'a>,
}

#[derive(Serialize)]
struct BrowserOptions<'a> {
    headless: bool,
    args: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessage<'a> {
    chat_id: &'a str,
    media: &'a Media,
    options: &'a SendOptions,
}

#[derive(Deserialize)]
struct Registered {
    registered: bool,
}

#[derive(Deserialize)]
struct BridgeFailure {
    error: String,
}

/// [`MessagingClient`] backed by a browser-automation bridge.
pub struct BridgeClient {
    http: reqwest::Client,
    base: Url,
    client_id: String,
    browser_args: Vec<String>,
    call_timeout: Option<Duration>,
    events: broadcast::Sender<ClientEvent>,
    pump: Mutex<Option<JoinHandle<()>>>,
    closing: Arc<AtomicBool>,
}

impl BridgeClient {
    /// Build a client for the session described by `config`.
    pub fn new(config: &SessionConfig, http: reqwest::Client) -> Result<Self, ClientError> {
        let base = Url::parse(&config.bridge_url).map_err(|e| {
            ClientError::Config(format!("invalid bridge URL '{}': {}", config.bridge_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "bridge URL '{}' cannot be a base",
                config.bridge_url
            )));
        }

        let (events, _) = broadcast::channel(32);
        let call_timeout = match config.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            http,
            base,
            client_id: config.client_id.clone(),
            browser_args: config.browser_args.clone(),
            call_timeout,
            events,
            pump: Mutex::new(None),
            closing: Arc::new(AtomicBool::new(false)),
        })
    }

    /// `{base}/sessions/{client_id}/{segments...}`
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["sessions", self.client_id.as_str()])
                .extend(segments);
        }
        url
    }

    fn events_url(&self) -> Result<Url, ClientError> {
        let mut url = self.endpoint(&["events"]);
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme).map_err(|_| {
            ClientError::Config(format!("cannot derive event feed URL from '{}'", self.base))
        })?;
        Ok(url)
    }

    async fn call<T, F>(&self, fut: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        match self.call_timeout {
            Some(deadline) => race_deadline(fut, deadline)
                .await
                .unwrap_or(Err(ClientError::Timeout(deadline.as_secs()))),
            None => fut.await,
        }
    }

    fn set_pump(&self, handle: JoinHandle<()>) {
        let previous = match self.pump.lock() {
            Ok(mut slot) => slot.replace(handle),
            Err(poisoned) => poisoned.into_inner().replace(handle),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn stop_pump(&self) {
        let handle = match self.pump.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

/// Turn a non-2xx bridge response into [`ClientError::Remote`].
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<BridgeFailure>().await {
        Ok(body) if !body.error.is_empty() => body.error,
        _ => format!("bridge responded with status {}", status),
    };
    Err(ClientError::Remote(message))
}

async fn pump_events(
    mut stream: EventStream,
    events: broadcast::Sender<ClientEvent>,
    closing: Arc<AtomicBool>,
) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match parse_event(&text) {
                Ok(event) => {
                    let _ = events.send(event);
                }
                Err(e) => tracing::warn!(error = %e, "Ignoring malformed bridge event"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Bridge event stream error");
                break;
            }
        }
    }

    if !closing.load(Ordering::SeqCst) {
        let _ = events.send(ClientEvent::Disconnected("event stream closed".into()));
    }
}

#[async_trait]
impl MessagingClient for BridgeClient {
    fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    async fn initialize(&self) -> Result<(), ClientError> {
        let events_url = self.events_url()?;
        let (stream, _) = connect_async(events_url.as_str())
            .await
            .map_err(|e| ClientError::EventStream(e.to_string()))?;

        tracing::debug!(url = %events_url, "Bridge event stream connected");
        self.set_pump(tokio::spawn(pump_events(
            stream,
            self.events.clone(),
            self.closing.clone(),
        )));

        let body = StartSession {
            client_id: &self.client_id,
            puppeteer: BrowserOptions {
                headless: true,
                args: &self.browser_args,
            },
        };
        self.call(async {
            let response = self.http.post(self.endpoint(&[])).json(&body).send().await?;
            check(response).await?;
            Ok::<_, ClientError>(())
        })
        .await
    }

    async fn is_registered_user(&self, id: &str) -> Result<bool, ClientError> {
        self.call(async {
            let response = self
                .http
                .get(self.endpoint(&["contacts", id, "registered"]))
                .send()
                .await?;
            let body: Registered = check(response).await?.json().await?;
            Ok::<_, ClientError>(body.registered)
        })
        .await
    }

    async fn send_message(
        &self,
        id: &str,
        media: Media,
        options: SendOptions,
    ) -> Result<(), ClientError> {
        let body = SendMessage {
            chat_id: id,
            media: &media,
            options: &options,
        };
        self.call(async {
            let response = self
                .http
                .post(self.endpoint(&["messages"]))
                .json(&body)
                .send()
                .await?;
            check(response).await?;
            Ok::<_, ClientError>(())
        })
        .await
    }

    async fn destroy(&self) -> Result<(), ClientError> {
        self.closing.store(true, Ordering::SeqCst);
        let result = self
            .call(async {
                let response = self.http.delete(self.endpoint(&[])).send().await?;
                check(response).await?;
                Ok::<_, ClientError>(())
            })
            .await;
        self.stop_pump();
        result
    }
}

impl std::fmt::Debug for BridgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeClient")
            .field("base", &self.base.as_str())
            .field("client_id", &self.client_id)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
