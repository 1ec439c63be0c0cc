use std::sync::Arc;

use anyhow::{Context as _, bail};
use serenity::all::{ActivityData, ChannelId, Http, OnlineStatus, ShardManager, ShardMessenger};
use tokio::{sync::Mutex, task::JoinHandle};

use crate::session::{Activity, ActivityKind, Presence, Status, transport::Link};

pub(super) type Runner = JoinHandle<Result<(), serenity::Error>>;

pub(super) struct DiscordLink {
    http: Arc<Http>,
    shard: ShardMessenger,
    shard_manager: Arc<ShardManager>,
    runner: Mutex<Option<Runner>>,
}

impl DiscordLink {
    pub fn new(
        http: Arc<Http>,
        shard: ShardMessenger,
        shard_manager: Arc<ShardManager>,
        runner: Runner,
    ) -> Self {
        Self {
            http,
            shard,
            shard_manager,
            runner: Mutex::new(Some(runner)),
        }
    }
}

#[async_trait::async_trait]
impl Link for DiscordLink {
    async fn set_presence(&self, presence: &Presence) -> anyhow::Result<()> {
        let activity = presence.activity.as_ref().map(activity_data).transpose()?;
        self.shard
            .set_presence(activity, online_status(presence.status));

        Ok(())
    }

    async fn send_message(&self, target: &str, body: &str) -> anyhow::Result<()> {
        let id: u64 = target
            .parse()
            .with_context(|| format!("invalid channel id {target:?}"))?;
        if id == 0 {
            bail!("invalid channel id 0");
        }

        ChannelId::new(id).say(&self.http, body).await?;

        Ok(())
    }

    async fn close(&self) {
        self.shard_manager.shutdown_all().await;

        if let Some(runner) = self.runner.lock().await.take() {
            runner.abort();
        }
    }
}

pub(super) fn online_status(status: Status) -> OnlineStatus {
    match status {
        Status::Online => OnlineStatus::Online,
        Status::Idle => OnlineStatus::Idle,
        Status::DoNotDisturb => OnlineStatus::DoNotDisturb,
        Status::Invisible => OnlineStatus::Invisible,
    }
}

pub(super) fn activity_data(activity: &Activity) -> anyhow::Result<ActivityData> {
    let label = activity.label.clone();

    Ok(match activity.kind {
        ActivityKind::Playing => ActivityData::playing(label),
        ActivityKind::Listening => ActivityData::listening(label),
        ActivityKind::Watching => ActivityData::watching(label),
        ActivityKind::Competing => ActivityData::competing(label),
        ActivityKind::Streaming => {
            let url = activity
                .url
                .as_deref()
                .context("streaming activity needs a url")?;
            ActivityData::streaming(label, url)?
        }
    })
}
