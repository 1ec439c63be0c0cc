use std::sync::Arc;

use chrono::Utc;
use tokio::{
    sync::{Mutex, RwLock, broadcast, mpsc},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use super::{
    Backoff, ConnectError, ConnectionState, Presence, Ready, Session, SessionError,
    transport::{Connection, Credential, InboundEvent, Link, Transport},
};

/// Lifecycle notifications, broadcast to every subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    StateChanged(ConnectionState),
    Ready(Ready),
}

struct SessionInner {
    transport: Arc<dyn Transport>,
    backoff: Backoff,
    session: RwLock<Session>,
    link: RwLock<Option<Arc<dyn Link>>>,
    signals: broadcast::Sender<SessionSignal>,
    inbound: mpsc::Sender<InboundEvent>,
    cancel: Mutex<CancellationToken>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
    /// Held by `connect` until the supervisor is stored, and by `disconnect`
    /// for the whole teardown.
    lifecycle: Mutex<()>,
}

/// Owns the [`Session`] and the connection behind it. Cheap to clone; every
/// clone drives the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        backoff: Backoff,
        inbound: mpsc::Sender<InboundEvent>,
    ) -> Self {
        let (signals, _) = broadcast::channel(64);

        Self {
            inner: Arc::new(SessionInner {
                transport,
                backoff,
                session: RwLock::new(Session::new()),
                link: RwLock::new(None),
                signals,
                inbound,
                cancel: Mutex::new(CancellationToken::new()),
                supervisor: Mutex::new(None),
                lifecycle: Mutex::new(()),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionSignal> {
        self.inner.signals.subscribe()
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.session.read().await.state
    }

    /// True when `author_id` is the connected bot itself.
    pub async fn is_own(&self, author_id: &str) -> bool {
        self.inner.session.read().await.is_own(author_id)
    }

    pub async fn snapshot(&self) -> Session {
        self.inner.session.read().await.clone()
    }

    pub async fn uptime(&self) -> chrono::Duration {
        self.inner.session.read().await.uptime()
    }

    /// Records activity on the session.
    pub async fn touch(&self) {
        self.inner.session.write().await.last_activity = Some(Utc::now());
    }

    /// Connects, retrying transient failures with backoff until connected,
    /// rejected, or cancelled by [`SessionManager::disconnect`]. Once
    /// connected, dropped connections are re-established in the background.
    pub async fn connect(&self, credential: Credential) -> Result<Session, ConnectError> {
        let _lifecycle = self.inner.lifecycle.lock().await;

        let state = self.state().await;
        if state != ConnectionState::Disconnected {
            log::warn!("connect called while {state:?}, ignoring");
            return Ok(self.snapshot().await);
        }

        // only a disconnect still tearing down leaves this cancelled
        let cancel = self.inner.cancel.lock().await.clone();

        self.set_state(ConnectionState::Connecting).await;
        let connection = self.establish(&credential, &cancel).await?;
        let events = self.install(connection, &cancel).await?;

        let supervisor = tokio::spawn(self.clone().supervise(events, credential, cancel));
        *self.inner.supervisor.lock().await = Some(supervisor);

        Ok(self.snapshot().await)
    }

    /// Stops the session: cancels any connect attempt or pending reconnect
    /// timer, closes the link, and leaves the state `Disconnected`.
    pub async fn disconnect(&self) {
        // cancel before queueing on the lifecycle lock so a connect stuck in
        // backoff gives it up
        self.inner.cancel.lock().await.cancel();
        let _lifecycle = self.inner.lifecycle.lock().await;

        let supervisor = self.inner.supervisor.lock().await.take();
        if let Some(supervisor) = supervisor {
            if let Err(why) = supervisor.await {
                log::error!("session supervisor failed: {why:?}");
            }
        }

        self.detach_link().await;
        self.set_state(ConnectionState::Disconnected).await;
        *self.inner.cancel.lock().await = CancellationToken::new();
        log::info!("session disconnected");
    }

    /// Resolves once the session is `Disconnected`.
    pub async fn closed(&self) {
        let mut signals = self.subscribe();

        loop {
            if self.state().await == ConnectionState::Disconnected {
                return;
            }

            match signals.recv().await {
                Ok(SessionSignal::StateChanged(ConnectionState::Disconnected)) => return,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }

    /// Stores the presence and pushes it to the platform if connected.
    /// While disconnected it is kept and applied on the next connect.
    pub async fn set_presence(&self, presence: Presence) -> Result<(), SessionError> {
        self.inner.session.write().await.presence = Some(presence.clone());

        match self.current_link().await {
            Some(link) => Ok(link.set_presence(&presence).await?),
            None => {
                log::debug!("not connected, presence will be applied on connect");
                Ok(())
            }
        }
    }

    pub async fn send_message(&self, target: &str, body: &str) -> Result<(), SessionError> {
        let link = self
            .current_link()
            .await
            .ok_or(SessionError::NotConnected)?;

        Ok(link.send_message(target, body).await?)
    }

    async fn current_link(&self) -> Option<Arc<dyn Link>> {
        self.inner.link.read().await.clone()
    }

    async fn set_state(&self, state: ConnectionState) {
        {
            let mut session = self.inner.session.write().await;
            if session.state == state {
                return;
            }
            log::debug!("session state {:?} -> {state:?}", session.state);
            session.state = state;
        }

        let _ = self.inner.signals.send(SessionSignal::StateChanged(state));
    }

    async fn establish(
        &self,
        credential: &Credential,
        cancel: &CancellationToken,
    ) -> Result<Connection, ConnectError> {
        let mut attempt = 0u32;

        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ConnectError::Cancelled),
                result = self.inner.transport.connect(credential) => result,
            };

            match result {
                Ok(connection) => return Ok(connection),
                Err(why) if why.is_retryable() => {
                    self.set_state(ConnectionState::Reconnecting).await;

                    let delay = self.inner.backoff.delay(attempt);
                    attempt = attempt.saturating_add(1);
                    log::warn!("connect attempt {attempt} failed: {why}, retrying in {delay:?}");

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            self.set_state(ConnectionState::Disconnected).await;
                            return Err(ConnectError::Cancelled);
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(why) => {
                    self.set_state(ConnectionState::Disconnected).await;
                    return Err(why);
                }
            }
        }
    }

    async fn install(
        &self,
        connection: Connection,
        cancel: &CancellationToken,
    ) -> Result<mpsc::Receiver<InboundEvent>, ConnectError> {
        let Connection {
            ready,
            events,
            link,
        } = connection;

        if cancel.is_cancelled() {
            link.close().await;
            self.set_state(ConnectionState::Disconnected).await;
            return Err(ConnectError::Cancelled);
        }

        let presence = {
            let mut session = self.inner.session.write().await;
            session.identity = Some(ready.identity.clone());
            session.spaces = ready.spaces.clone();
            session.last_activity = Some(Utc::now());
            session.presence.clone()
        };
        *self.inner.link.write().await = Some(link.clone());

        self.set_state(ConnectionState::Connected).await;
        log::info!(
            "connected as {} ({}) in {} space(s)",
            ready.identity.name,
            ready.identity.id,
            ready.spaces.len()
        );

        if let Some(presence) = presence {
            if let Err(why) = link.set_presence(&presence).await {
                log::warn!("failed to apply presence: {why:?}");
            }
        }

        let _ = self.inner.signals.send(SessionSignal::Ready(ready));

        Ok(events)
    }

    async fn detach_link(&self) {
        let link = self.inner.link.write().await.take();
        if let Some(link) = link {
            link.close().await;
        }
    }

    async fn supervise(
        self,
        mut events: mpsc::Receiver<InboundEvent>,
        credential: Credential,
        cancel: CancellationToken,
    ) {
        loop {
            self.pump(&mut events, &cancel).await;
            if cancel.is_cancelled() {
                return;
            }

            log::warn!("connection dropped, reconnecting");
            self.detach_link().await;
            self.set_state(ConnectionState::Reconnecting).await;

            let reconnected = match self.establish(&credential, &cancel).await {
                Ok(connection) => self.install(connection, &cancel).await,
                Err(why) => Err(why),
            };

            match reconnected {
                Ok(next) => events = next,
                Err(ConnectError::Cancelled) => return,
                Err(why) => {
                    log::error!("giving up on session: {why}");
                    return;
                }
            }
        }
    }

    /// Forwards inbound events to the router until the connection drops or
    /// the session is cancelled.
    async fn pump(&self, events: &mut mpsc::Receiver<InboundEvent>, cancel: &CancellationToken) {
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                event = events.recv() => event,
            };

            let Some(event) = event else {
                return;
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                sent = self.inner.inbound.send(event) => {
                    if sent.is_err() {
                        log::warn!("router is gone, dropping inbound event");
                    }
                }
            }
        }
    }
}
