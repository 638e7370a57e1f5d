//! Shared utilities for API integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use wa_checker::config::{AppConfig, PacingMode};
use wa_checker::http::HttpServer;
use wa_checker::lifecycle::Shutdown;
use wa_checker::session::{
    ClientError, ClientEvent, Media, MediaError, MediaLoader, MediaOptions, MessagingClient,
    SendOptions, Session,
};

/// Scriptable messaging collaborator that counts every call.
pub struct MockClient {
    events: broadcast::Sender<ClientEvent>,
    registered: Mutex<HashSet<String>>,
    failures: Mutex<HashMap<String, String>>,
    pub lookups: AtomicUsize,
    pub sends: AtomicUsize,
    pub destroys: AtomicUsize,
    pub hang_on_destroy: AtomicBool,
    sent: Mutex<Vec<(String, String)>>,
}

impl MockClient {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            events,
            registered: Mutex::new(HashSet::new()),
            failures: Mutex::new(HashMap::new()),
            lookups: AtomicUsize::new(0),
            sends: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
            hang_on_destroy: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    pub fn register(&self, digits: &str) {
        self.registered
            .lock()
            .unwrap()
            .insert(format!("{digits}@c.us"));
    }

    pub fn fail(&self, digits: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(format!("{digits}@c.us"), message.to_string());
    }

    /// Collaborator calls that touch the network (lookups and sends).
    pub fn business_calls(&self) -> usize {
        self.lookups.load(Ordering::SeqCst) + self.sends.load(Ordering::SeqCst)
    }

    /// `(user id, caption)` of every message sent.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingClient for MockClient {
    fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    async fn initialize(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn is_registered_user(&self, id: &str) -> Result<bool, ClientError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failures.lock().unwrap().get(id) {
            return Err(ClientError::Remote(message.clone()));
        }
        Ok(self.registered.lock().unwrap().contains(id))
    }

    async fn send_message(
        &self,
        id: &str,
        _media: Media,
        options: SendOptions,
    ) -> Result<(), ClientError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.sent
            .lock()
            .unwrap()
            .push((id.to_string(), options.caption));
        Ok(())
    }

    async fn destroy(&self) -> Result<(), ClientError> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        if self.hang_on_destroy.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

/// Media loader that returns a fixed one-pixel PNG.
pub struct MockMedia {
    pub calls: AtomicUsize,
}

impl MockMedia {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MediaLoader for MockMedia {
    async fn from_url(&self, _url: &str, _options: MediaOptions) -> Result<Media, MediaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Media {
            mimetype: "image/png".into(),
            data: "iVBORw0KGgo=".into(),
            filename: Some("pixel.png".into()),
            filesize: Some(8),
        })
    }
}

/// A running API server backed by mocks.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Arc<MockClient>,
    pub media: Arc<MockMedia>,
    pub session: Session,
    pub shutdown: Arc<Shutdown>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server on an ephemeral port with batch pacing disabled.
///
/// With `ready`, the mock emits `Ready` and this waits until the session
/// reports it.
pub async fn start_server(ready: bool) -> TestServer {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.batch.pacing = PacingMode::None;

    let client = Arc::new(MockClient::new());
    let media = Arc::new(MockMedia::new());
    let session = Session::new(client.clone());
    session.start();

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Arc::new(Shutdown::new());
    let server = HttpServer::new(config, session.clone(), media.clone());
    tokio::spawn(server.run(listener, shutdown.subscribe()));

    if ready {
        client.emit(ClientEvent::Authenticated);
        client.emit(ClientEvent::Ready);
        wait_for(|| session.is_ready()).await;
    }

    TestServer {
        addr,
        client,
        media,
        session,
        shutdown,
    }
}

/// Poll `condition` until it holds, failing after two seconds.
pub async fn wait_for(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 2s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
