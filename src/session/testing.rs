//! In-memory transport for exercising the session and the router.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

use super::{
    ConnectError, Identity, Presence, Ready, Space,
    transport::{Connection, Credential, InboundEvent, Link, Transport},
};

pub enum Outcome {
    Connect,
    Transient,
    InvalidCredential,
}

#[derive(Default)]
pub struct MockLink {
    presences: Mutex<Vec<Presence>>,
    sent: Mutex<Vec<(String, String)>>,
    closed: AtomicUsize,
}

impl MockLink {
    pub fn presences(&self) -> Vec<Presence> {
        self.presences.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Link for MockLink {
    async fn set_presence(&self, presence: &Presence) -> anyhow::Result<()> {
        self.presences.lock().unwrap().push(presence.clone());
        Ok(())
    }

    async fn send_message(&self, target: &str, body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((target.to_string(), body.to_string()));
        Ok(())
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Plays back scripted outcomes, one per connect attempt. Once the script
/// runs out every attempt fails transiently.
pub struct MockTransport {
    outcomes: Mutex<VecDeque<Outcome>>,
    attempts: AtomicUsize,
    feed: Mutex<Option<mpsc::Sender<InboundEvent>>>,
    gated: AtomicBool,
    gate: Notify,
    pub link: Arc<MockLink>,
}

impl MockTransport {
    pub fn new(outcomes: impl IntoIterator<Item = Outcome>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            attempts: AtomicUsize::new(0),
            feed: Mutex::new(None),
            gated: AtomicBool::new(false),
            gate: Notify::new(),
            link: Arc::new(MockLink::default()),
        })
    }

    /// Like [`MockTransport::new`], but every attempt parks until
    /// [`MockTransport::open_gate`] lets it through.
    pub fn gated(outcomes: impl IntoIterator<Item = Outcome>) -> Arc<Self> {
        let transport = Self::new(outcomes);
        transport.gated.store(true, Ordering::SeqCst);
        transport
    }

    /// Releases one parked (or the next) connect attempt.
    pub fn open_gate(&self) {
        self.gate.notify_one();
    }

    pub fn failing() -> Arc<Self> {
        Self::new(Vec::<Outcome>::new())
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Sender feeding the most recent connection.
    pub fn feed(&self) -> Option<mpsc::Sender<InboundEvent>> {
        self.feed.lock().unwrap().clone()
    }

    /// Simulates the platform dropping the current connection.
    pub fn drop_connection(&self) {
        self.feed.lock().unwrap().take();
    }
}

pub fn ready() -> Ready {
    Ready {
        identity: Identity {
            id: "bot".to_string(),
            name: "commandbot".to_string(),
        },
        spaces: vec![Space {
            id: "1".to_string(),
            name: Some("test space".to_string()),
        }],
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, _credential: &Credential) -> Result<Connection, ConnectError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.gated.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Outcome::Transient);

        match outcome {
            Outcome::Connect => {
                let (tx, rx) = mpsc::channel(32);
                *self.feed.lock().unwrap() = Some(tx);

                Ok(Connection {
                    ready: ready(),
                    events: rx,
                    link: self.link.clone(),
                })
            }
            Outcome::Transient => Err(ConnectError::transient("scripted failure")),
            Outcome::InvalidCredential => Err(ConnectError::InvalidCredential),
        }
    }
}
