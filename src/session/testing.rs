//! In-memory collaborator for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::session::client::{
    ClientError, ClientEvent, Media, MediaLoader, MediaOptions, MessagingClient, SendOptions,
};
use crate::session::media::MediaError;

pub struct StubClient {
    events: broadcast::Sender<ClientEvent>,
    registered: Mutex<HashSet<String>>,
    failures: Mutex<HashMap<String, String>>,
    checked: Mutex<Vec<String>>,
    init_calls: AtomicUsize,
    destroy_calls: AtomicUsize,
    fail_initialize: AtomicBool,
    hang_on_destroy: AtomicBool,
    fail_destroy: AtomicBool,
}

impl StubClient {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            events,
            registered: Mutex::new(HashSet::new()),
            failures: Mutex::new(HashMap::new()),
            checked: Mutex::new(Vec::new()),
            init_calls: AtomicUsize::new(0),
            destroy_calls: AtomicUsize::new(0),
            fail_initialize: AtomicBool::new(false),
            hang_on_destroy: AtomicBool::new(false),
            fail_destroy: AtomicBool::new(false),
        }
    }

    pub fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    pub fn register(&self, id: &str) {
        self.registered.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_lookup(&self, id: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(id.to_string(), message.to_string());
    }

    pub fn fail_initialize(&self) {
        self.fail_initialize.store(true, Ordering::SeqCst);
    }

    pub fn hang_on_destroy(&self) {
        self.hang_on_destroy.store(true, Ordering::SeqCst);
    }

    pub fn fail_destroy(&self) {
        self.fail_destroy.store(true, Ordering::SeqCst);
    }

    pub fn checked(&self) -> Vec<String> {
        self.checked.lock().unwrap().clone()
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn destroy_calls(&self) -> usize {
        self.destroy_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagingClient for StubClient {
    fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    async fn initialize(&self) -> Result<(), ClientError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_initialize.load(Ordering::SeqCst) {
            return Err(ClientError::Remote("browser failed to launch".into()));
        }
        Ok(())
    }

    async fn is_registered_user(&self, id: &str) -> Result<bool, ClientError> {
        self.checked.lock().unwrap().push(id.to_string());
        if let Some(message) = self.failures.lock().unwrap().get(id) {
            return Err(ClientError::Remote(message.clone()));
        }
        Ok(self.registered.lock().unwrap().contains(id))
    }

    async fn send_message(
        &self,
        _id: &str,
        _media: Media,
        _options: SendOptions,
    ) -> Result<(), ClientError> {
        Ok(())
    }

    async fn destroy(&self) -> Result<(), ClientError> {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_on_destroy.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_destroy.load(Ordering::SeqCst) {
            return Err(ClientError::Remote("Protocol error: Target closed".into()));
        }
        Ok(())
    }
}

pub struct StubMedia {
    pub calls: AtomicUsize,
}

impl StubMedia {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MediaLoader for StubMedia {
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
