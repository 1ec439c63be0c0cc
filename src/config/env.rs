use thiserror::Error;

use crate::session::transport::Credential;

pub const TOKEN_VAR: &str = "DISCORD_TOKEN_TEST_BOT";
pub const ADMIN_VAR: &str = "AUTHOR_ID";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Secrets and identities that come from the environment rather than the
/// config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credential: Credential,
    pub admin_id: String,
}

impl Settings {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(why) = dotenvy::dotenv() {
            if !why.not_found() {
                log::warn!("could not load .env: {why}");
            }
        }

        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup(TOKEN_VAR)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::Missing(TOKEN_VAR))?;

        let admin = lookup(ADMIN_VAR).ok_or(ConfigError::Missing(ADMIN_VAR))?;
        let admin_id = match admin.trim().parse::<u64>() {
            Ok(0) => {
                return Err(ConfigError::Invalid {
                    var: ADMIN_VAR,
                    reason: "must be non-zero".to_string(),
                });
            }
            Ok(id) => id.to_string(),
            Err(why) => {
                return Err(ConfigError::Invalid {
                    var: ADMIN_VAR,
                    reason: why.to_string(),
                });
            }
        };

        Ok(Self {
            credential: Credential::new(token),
            admin_id,
        })
    }
}
