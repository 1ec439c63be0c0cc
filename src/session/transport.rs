use std::{fmt, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::{ConnectError, Presence, Ready};

/// A message received from the platform, in the router's own representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Channel the message was posted in; replies go back here.
    pub source_id: String,
    pub author_id: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl InboundEvent {
    pub fn new(
        source_id: impl Into<String>,
        author_id: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            author_id: author_id.into(),
            body: body.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Outbound half of a live connection.
#[async_trait]
pub trait Link: Send + Sync {
    async fn set_presence(&self, presence: &Presence) -> anyhow::Result<()>;

    async fn send_message(&self, target: &str, body: &str) -> anyhow::Result<()>;

    /// Tear down the connection. Must be safe to call more than once.
    async fn close(&self);
}

/// An established connection. The connection is considered dropped once
/// `events` yields `None`.
pub struct Connection {
    pub ready: Ready,
    pub events: mpsc::Receiver<InboundEvent>,
    pub link: Arc<dyn Link>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one connection attempt, resolving once the post-connect
    /// handshake has completed.
    async fn connect(&self, credential: &Credential) -> Result<Connection, ConnectError>;
}
