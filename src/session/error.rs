use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectError {
    /// The platform rejected the token. Never retried.
    #[error("invalid credential")]
    InvalidCredential,
    #[error("transient connection failure: {0}")]
    Transient(String),
    #[error("connect cancelled by disconnect")]
    Cancelled,
}

impl ConnectError {
    pub fn transient(why: impl std::fmt::Display) -> Self {
        Self::Transient(why.to_string())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is not connected")]
    NotConnected,
    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
}
