use std::{process::ExitCode, sync::Arc};

use config::{
    env::{Settings, TOKEN_VAR},
    store::BotConfig,
};
use discord::DiscordTransport;
use session::ConnectError;
use utils::log::Logger;

mod bot;
mod config;
mod discord;
mod session;
mod utils;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match BotConfig::read(BotConfig::default_path()) {
        Ok(config) => config,
        Err(why) => {
            eprintln!("could not load config: {why:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(why) = Logger::init(config.log.level_filter(), &config.log.file) {
        eprintln!("could not open log file {}: {why}", config.log.file);
        return ExitCode::FAILURE;
    }

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(why) => {
            log::error!("{why}");
            return ExitCode::FAILURE;
        }
    };

    let transport = Arc::new(DiscordTransport::new(config.session.ready_timeout()));
    let bot = match bot::CommandBot::new(&config, settings, transport) {
        Ok(bot) => bot,
        Err(why) => {
            log::error!("{why}");
            return ExitCode::FAILURE;
        }
    };

    match bot.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(why) => {
            match why.downcast_ref::<ConnectError>() {
                Some(ConnectError::InvalidCredential) => {
                    log::error!("Invalid bot token. Please check {TOKEN_VAR}.")
                }
                _ => log::error!("bot stopped: {why:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
