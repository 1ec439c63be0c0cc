use chrono::Utc;

use crate::{
    bot::{error::HandlerResult, registry::CommandContext},
    utils::misc,
};

pub async fn ping(ctx: CommandContext) -> HandlerResult {
    let latency = Utc::now()
        .signed_duration_since(ctx.event.timestamp)
        .num_milliseconds()
        .max(0);

    ctx.reply(format!("Pong! latency: {latency}ms")).await
}

pub async fn uptime(ctx: CommandContext) -> HandlerResult {
    let uptime = ctx.session.uptime().await;

    ctx.reply(format!("Uptime: {}", misc::time_to_string(uptime)))
        .await
}

pub async fn help(ctx: CommandContext) -> HandlerResult {
    let lines: Vec<String> = ctx
        .registry
        .entries()
        .filter(|entry| entry.permission <= ctx.level)
        .map(|entry| match &entry.description {
            Some(description) => format!("`{}` {description}", entry.token),
            None => format!("`{}`", entry.token),
        })
        .collect();

    ctx.reply(format!("Commands:\n{}", lines.join("\n"))).await
}
