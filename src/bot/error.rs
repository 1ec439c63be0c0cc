use thiserror::Error;

use crate::session::SessionError;

#[derive(Debug, Error)]
#[error("command {token:?} is already registered")]
pub struct DuplicateCommandError {
    pub token: String,
}

/// Failure of a single command invocation. Never escapes the router.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("usage: {0}")]
    Usage(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("handler panicked: {0}")]
    Panicked(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn usage(text: impl Into<String>) -> Self {
        Self::Usage(text.into())
    }
}

pub type HandlerResult = Result<(), HandlerError>;
