use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};

use crate::{
    config::{env::Settings, structure::BotConfigInner},
    session::{
        Presence, SessionManager, SessionSignal,
        transport::{Credential, InboundEvent, Transport},
    },
};
use error::DuplicateCommandError;
use registry::CommandRegistry;
use router::EventRouter;

mod commands;
mod error;
mod registry;
mod router;

pub struct CommandBot {
    session: SessionManager,
    router: EventRouter,
    events: mpsc::Receiver<InboundEvent>,
    credential: Credential,
    presence: Presence,
}

impl CommandBot {
    pub fn new(
        config: &BotConfigInner,
        settings: Settings,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, DuplicateCommandError> {
        let (tx, events) = mpsc::channel(256);
        let session = SessionManager::new(transport, config.session.backoff(), tx);

        let mut registry = CommandRegistry::new();
        commands::register_builtin(&mut registry, &config.bot.prefix)?;
        log::debug!("{} commands registered", registry.len());

        let router = EventRouter::new(Arc::new(registry), session.clone(), settings.admin_id);

        Ok(Self {
            session,
            router,
            events,
            credential: settings.credential,
            presence: config.presence.clone(),
        })
    }

    /// Connects and serves until ctrl-c, a shutdown command, or a session
    /// that gives up. Only a failed initial connect is an error.
    pub async fn run(self) -> Result<()> {
        let CommandBot {
            session,
            router,
            events,
            credential,
            presence,
        } = self;

        let diagnostics = tokio::spawn(diagnostics(session.clone(), session.subscribe()));
        let routing: JoinHandle<()> = tokio::spawn(router.run(events));

        let result = serve(&session, presence, credential).await;

        diagnostics.abort();
        routing.abort();

        result
    }
}

async fn serve(session: &SessionManager, presence: Presence, credential: Credential) -> Result<()> {
    session.set_presence(presence).await?;
    session.connect(credential).await?;

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => log::info!("interrupted, shutting down"),
                Err(why) => log::error!("could not listen for ctrl-c: {why}"),
            }
            session.disconnect().await;
        }
        _ = session.closed() => log::info!("session closed"),
    }

    Ok(())
}

/// Logs who we are and where, every time a handshake completes.
async fn diagnostics(session: SessionManager, mut signals: broadcast::Receiver<SessionSignal>) {
    let mut first = true;

    loop {
        let ready = match signals.recv().await {
            Ok(SessionSignal::Ready(ready)) => ready,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return,
        };

        log::info!(
            "Logged in as {} (ID {})",
            ready.identity.name,
            ready.identity.id
        );
        if std::mem::take(&mut first) {
            let started_at = session.snapshot().await.started_at;
            log::info!("{}", startup_line(Utc::now() - started_at));
        }
        log::info!("Connected to {} space(s):", ready.spaces.len());
        for space in &ready.spaces {
            log::info!(
                "  {} ({})",
                space.name.as_deref().unwrap_or("unknown"),
                space.id
            );
        }
    }
}

fn startup_line(elapsed: chrono::Duration) -> String {
    let seconds = elapsed.num_milliseconds().max(0) as f64 / 1000.0;
    format!("Bot startup time: {seconds:.2} seconds")
}
