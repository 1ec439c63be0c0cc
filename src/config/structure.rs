use std::time::Duration;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::session::{Backoff, Presence};

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct BotConfigTOML {
    #[serde(default)]
    pub config: BotConfigInner,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct BotConfigInner {
    pub bot: CommandConfig,
    pub presence: Presence,
    pub session: SessionConfig,
    pub log: LogConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CommandConfig {
    pub prefix: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: f64,
    /// How long a connect attempt may wait for the gateway handshake.
    pub ready_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
            jitter: 0.25,
            ready_timeout_secs: 30,
        }
    }
}

impl SessionConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
        .with_jitter(self.jitter)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub file: String,
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: "main-error.log".to_string(),
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Unknown level names fall back to `info`.
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }
}
