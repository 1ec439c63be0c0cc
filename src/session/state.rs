use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Online status the bot advertises. Closed set, mapped onto the platform's
/// own enum by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Online,
    #[default]
    Idle,
    DoNotDisturb,
    Invisible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    #[default]
    Playing,
    Listening,
    Watching,
    Streaming,
    Competing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub label: String,
    /// Only meaningful for [`ActivityKind::Streaming`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Activity {
    pub fn new(kind: ActivityKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<Activity>,
}

impl Default for Presence {
    fn default() -> Self {
        Self {
            status: Status::Idle,
            activity: Some(Activity::new(ActivityKind::Playing, "Blue Archive")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub name: String,
}

/// A guild (or any other joinable space) the bot is a member of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    pub id: String,
    pub name: Option<String>,
}

/// Result of a completed post-connect handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ready {
    pub identity: Identity,
    pub spaces: Vec<Space>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub state: ConnectionState,
    pub started_at: DateTime<Utc>,
    pub last_activity: Option<DateTime<Utc>>,
    pub presence: Option<Presence>,
    pub identity: Option<Identity>,
    pub spaces: Vec<Space>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            started_at: Utc::now(),
            last_activity: None,
            presence: None,
            identity: None,
            spaces: Vec::new(),
        }
    }

    pub fn uptime(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.started_at)
    }

    pub fn is_own(&self, author_id: &str) -> bool {
        self.identity
            .as_ref()
            .is_some_and(|identity| identity.id == author_id)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
