use chrono::{DateTime, Utc};
use serenity::{
    all::{Context, EventHandler, Message, ShardMessenger},
    async_trait,
};
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::session::{Identity, Ready, Space, transport::InboundEvent};

pub(super) type Handshake = (Ready, ShardMessenger);

/// Bridges serenity's callbacks onto the session's channels.
pub(super) struct Forwarder {
    events: mpsc::Sender<InboundEvent>,
    ready: Mutex<Option<oneshot::Sender<Handshake>>>,
}

impl Forwarder {
    pub fn new(events: mpsc::Sender<InboundEvent>, ready: oneshot::Sender<Handshake>) -> Self {
        Self {
            events,
            ready: Mutex::new(Some(ready)),
        }
    }
}

#[async_trait]
impl EventHandler for Forwarder {
    async fn ready(&self, ctx: Context, ready: serenity::all::Ready) {
        let handshake = Ready {
            identity: Identity {
                id: ready.user.id.to_string(),
                name: ready.user.name.clone(),
            },
            spaces: ready
                .guilds
                .iter()
                .map(|guild| Space {
                    id: guild.id.to_string(),
                    name: None,
                })
                .collect(),
        };

        match self.ready.lock().await.take() {
            Some(tx) => {
                let _ = tx.send((handshake, ctx.shard.clone()));
            }
            // serenity re-identified on its own; the session is unaffected
            None => log::info!("{} re-identified with the gateway", ready.user.name),
        }
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let timestamp = DateTime::<Utc>::from_timestamp(msg.timestamp.unix_timestamp(), 0)
            .unwrap_or_else(Utc::now);

        let event = InboundEvent {
            source_id: msg.channel_id.to_string(),
            author_id: msg.author.id.to_string(),
            body: msg.content,
            timestamp,
        };

        if self.events.send(event).await.is_err() {
            log::debug!("session stopped listening, dropping message");
        }
    }
}
