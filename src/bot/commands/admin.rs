use crate::{
    bot::{
        error::{HandlerError, HandlerResult},
        registry::CommandContext,
    },
    session::{Activity, ActivityKind, Presence, Status},
    utils::misc,
};

pub async fn status(ctx: CommandContext) -> HandlerResult {
    let session = ctx.session.snapshot().await;

    let state = serde_plain::to_string(&session.state).map_err(anyhow::Error::from)?;
    let identity = session
        .identity
        .as_ref()
        .map(|identity| format!("{} ({})", identity.name, identity.id))
        .unwrap_or_else(|| "unknown".to_string());
    let last_activity = session
        .last_activity
        .map(|at| format!("{} ago", misc::time_to_string(chrono::Utc::now() - at)))
        .unwrap_or_else(|| "never".to_string());
    let presence = match &session.presence {
        Some(presence) => describe_presence(presence)?,
        None => "default".to_string(),
    };

    ctx.reply(format!(
        "state: {state}\nidentity: {identity}\nspaces: {}\nuptime: {}\nlast activity: {last_activity}\npresence: {presence}",
        session.spaces.len(),
        misc::time_to_string(session.uptime()),
    ))
    .await
}

pub async fn presence(ctx: CommandContext) -> HandlerResult {
    let presence = parse_presence(&ctx.args)?;
    let description = describe_presence(&presence)?;

    ctx.session.set_presence(presence).await?;
    ctx.reply(format!("Presence set to {description}.")).await
}

pub async fn shutdown(ctx: CommandContext) -> HandlerResult {
    log::info!("shutdown requested by {}", ctx.event.author_id);

    ctx.reply("Shutting down.").await?;
    ctx.session.disconnect().await;

    Ok(())
}

const PRESENCE_USAGE: &str = "presence <online|idle|do_not_disturb|invisible> \
    [playing|listening|watching|competing <label...> | streaming <url> <label...>]";

fn parse_presence(args: &[String]) -> Result<Presence, HandlerError> {
    let usage = || HandlerError::usage(PRESENCE_USAGE);

    let (status, rest) = args.split_first().ok_or_else(usage)?;
    let status: Status = serde_plain::from_str(status).map_err(|_| usage())?;

    let Some((kind, rest)) = rest.split_first() else {
        return Ok(Presence {
            status,
            activity: None,
        });
    };
    let kind: ActivityKind = serde_plain::from_str(kind).map_err(|_| usage())?;

    let (url, rest) = match kind {
        ActivityKind::Streaming => {
            let (url, rest) = rest.split_first().ok_or_else(usage)?;
            (Some(url.clone()), rest)
        }
        _ => (None, rest),
    };
    if rest.is_empty() {
        return Err(usage());
    }

    Ok(Presence {
        status,
        activity: Some(Activity {
            kind,
            label: rest.join(" "),
            url,
        }),
    })
}

fn describe_presence(presence: &Presence) -> Result<String, HandlerError> {
    let status = serde_plain::to_string(&presence.status).map_err(anyhow::Error::from)?;

    Ok(match &presence.activity {
        Some(activity) => {
            let kind = serde_plain::to_string(&activity.kind).map_err(anyhow::Error::from)?;
            format!("{status}, {kind} {}", activity.label)
        }
        None => status,
    })
}
