use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use serenity::{
    Client,
    all::{GatewayIntents, Http},
    gateway::GatewayError,
    http::HttpError,
};
use tokio::sync::{mpsc, oneshot};

use super::{
    handler::{Forwarder, Handshake},
    link::DiscordLink,
};
use crate::session::{
    ConnectError, Space,
    transport::{Connection, Credential, Transport},
};

pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
}

/// Connects to the Discord gateway through serenity. Each call builds a
/// fresh client; serenity's own shard-level resumes happen underneath, and
/// the connection counts as dropped once the client stops.
pub struct DiscordTransport {
    intents: GatewayIntents,
    ready_timeout: Duration,
}

impl DiscordTransport {
    pub fn new(ready_timeout: Duration) -> Self {
        Self {
            intents: intents(),
            ready_timeout,
        }
    }
}

enum Startup {
    Ready(Option<Handshake>),
    Stopped(Result<Result<(), serenity::Error>, tokio::task::JoinError>),
}

#[async_trait]
impl Transport for DiscordTransport {
    async fn connect(&self, credential: &Credential) -> Result<Connection, ConnectError> {
        serenity::utils::validate_token(credential.token())
            .map_err(|_| ConnectError::InvalidCredential)?;

        let (event_tx, event_rx) = mpsc::channel(256);
        let (ready_tx, ready_rx) = oneshot::channel();

        let mut client = Client::builder(credential.token(), self.intents)
            .event_handler(Forwarder::new(event_tx, ready_tx))
            .await
            .map_err(classify)?;

        // a rejected token surfaces here as a 401 instead of a gateway close
        client.http.get_current_user().await.map_err(classify)?;

        let http = client.http.clone();
        let shard_manager = client.shard_manager.clone();

        let mut runner = tokio::spawn(async move {
            let result = client.start().await;
            if let Err(why) = &result {
                log::warn!("gateway client stopped: {why}");
            }
            result
        });

        let startup = tokio::time::timeout(self.ready_timeout, async {
            tokio::select! {
                ready = ready_rx => Startup::Ready(ready.ok()),
                stopped = &mut runner => Startup::Stopped(stopped),
            }
        })
        .await;

        match startup {
            Ok(Startup::Ready(Some((mut ready, shard)))) => {
                name_spaces(&http, &mut ready.spaces).await;

                Ok(Connection {
                    ready,
                    events: event_rx,
                    link: Arc::new(DiscordLink::new(http, shard, shard_manager, runner)),
                })
            }
            Ok(Startup::Ready(None)) => {
                shard_manager.shutdown_all().await;
                Err(ConnectError::transient("client went away before ready"))
            }
            Ok(Startup::Stopped(Ok(Ok(())))) => {
                Err(ConnectError::transient("gateway closed before ready"))
            }
            Ok(Startup::Stopped(Ok(Err(why)))) => Err(classify(why)),
            Ok(Startup::Stopped(Err(why))) => Err(ConnectError::transient(why)),
            Err(_) => {
                shard_manager.shutdown_all().await;
                runner.abort();
                Err(ConnectError::transient(format!(
                    "no ready within {:?}",
                    self.ready_timeout
                )))
            }
        }
    }
}

/// The ready payload only carries guild ids; names come from the current
/// user's guild list. Failure here leaves the names unknown.
async fn name_spaces(http: &Http, spaces: &mut [Space]) {
    // one page covers every guild a bot without sharding can be in
    match http.get_guilds(None, Some(200)).await {
        Ok(guilds) => apply_names(
            spaces,
            guilds
                .into_iter()
                .map(|guild| (guild.id.to_string(), guild.name))
                .collect(),
        ),
        Err(why) => log::warn!("could not fetch guild names: {why}"),
    }
}

fn apply_names(spaces: &mut [Space], mut names: HashMap<String, String>) {
    for space in spaces {
        if let Some(name) = names.remove(&space.id) {
            space.name = Some(name);
        }
    }
}

fn classify(why: serenity::Error) -> ConnectError {
    match &why {
        serenity::Error::Gateway(GatewayError::InvalidAuthentication) => {
            ConnectError::InvalidCredential
        }
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 401 =>
        {
            ConnectError::InvalidCredential
        }
        _ => ConnectError::transient(why),
    }
}
