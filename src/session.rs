mod backoff;
mod error;
mod manager;
mod state;
pub mod transport;

#[cfg(test)]
pub mod testing;

pub use backoff::Backoff;
pub use error::{ConnectError, SessionError};
pub use manager::{SessionManager, SessionSignal};
pub use state::{
    Activity, ActivityKind, ConnectionState, Identity, Presence, Ready, Session, Space, Status,
};
