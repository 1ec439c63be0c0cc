use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use super::{
    error::HandlerError,
    registry::{CommandContext, CommandRegistry, PermissionLevel},
};
use crate::session::{SessionManager, transport::InboundEvent};

/// Routes inbound events to command handlers. Each dispatch runs on its own
/// task; the router never waits for a handler to finish.
pub struct EventRouter {
    registry: Arc<CommandRegistry>,
    session: SessionManager,
    admin_id: String,
}

impl EventRouter {
    pub fn new(
        registry: Arc<CommandRegistry>,
        session: SessionManager,
        admin_id: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            session,
            admin_id: admin_id.into(),
        }
    }

    /// Delivery loop, consumes events in arrival order until the channel
    /// closes.
    pub async fn run(self, mut events: mpsc::Receiver<InboundEvent>) {
        while let Some(event) = events.recv().await {
            self.on_inbound(event).await;
        }

        log::info!("inbound stream closed, router stopping");
    }

    pub fn permission_of(&self, author_id: &str) -> PermissionLevel {
        match author_id == self.admin_id {
            true => PermissionLevel::Admin,
            false => PermissionLevel::Everyone,
        }
    }

    /// Returns the handle of the spawned handler task, if the event was
    /// dispatched at all.
    pub async fn on_inbound(&self, event: InboundEvent) -> Option<JoinHandle<()>> {
        if self.session.is_own(&event.author_id).await {
            return None;
        }

        self.session.touch().await;

        let mut words = event.body.split_whitespace();
        let token = words.next()?;
        let args: Vec<String> = words.map(str::to_string).collect();

        let Some(entry) = self.registry.resolve(token) else {
            log::trace!("no command for {token:?}");
            return None;
        };

        let level = self.permission_of(&event.author_id);
        if level < entry.permission {
            log::warn!(
                "{} tried {} without permission ({level:?} < {:?})",
                event.author_id,
                entry.token,
                entry.permission
            );
            return None;
        }

        log::info!(
            "dispatching {} for {} in {}",
            entry.token,
            event.author_id,
            event.source_id
        );

        let token = entry.token.clone();
        let handler = entry.handler.clone();
        let session = self.session.clone();
        let source = event.source_id.clone();
        let ctx = CommandContext {
            event,
            args,
            level,
            session: self.session.clone(),
            registry: self.registry.clone(),
        };

        Some(tokio::spawn(async move {
            let result = AssertUnwindSafe(handler.call(ctx))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(HandlerError::Panicked(panic_message(&*panic))));

            if let Err(why) = result {
                log::error!("command {token} failed: {why}");

                let notice = format!("`{token}` failed: {why}");
                if let Err(relay) = session.send_message(&source, &notice).await {
                    log::warn!("could not report failure of {token}: {relay}");
                }
            }
        }))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
