mod handler;
mod link;
mod transport;

pub use transport::DiscordTransport;
