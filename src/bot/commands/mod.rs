use super::{
    error::DuplicateCommandError,
    registry::{CommandRegistry, PermissionLevel},
};

mod admin;
mod general;

/// Registers the built-in commands under `prefix`.
pub fn register_builtin(
    registry: &mut CommandRegistry,
    prefix: &str,
) -> Result<(), DuplicateCommandError> {
    let token = |name: &str| format!("{prefix}{name}");

    registry
        .register(token("ping"), general::ping, PermissionLevel::Everyone)?
        .describe("check that the bot is alive");
    registry
        .register(token("uptime"), general::uptime, PermissionLevel::Everyone)?
        .describe("how long the bot has been running");
    registry
        .register(token("help"), general::help, PermissionLevel::Everyone)?
        .describe("list the commands you can use");

    registry
        .register(token("status"), admin::status, PermissionLevel::Admin)?
        .describe("connection state and last activity");
    registry
        .register(token("presence"), admin::presence, PermissionLevel::Admin)?
        .describe("<status> [kind [url] label...] change the bot's presence");
    registry
        .register(token("shutdown"), admin::shutdown, PermissionLevel::Admin)?
        .describe("disconnect and stop the bot");

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        bot::router::EventRouter,
        session::{
            Backoff, ConnectionState, SessionManager, Status,
            testing::{MockLink, MockTransport, Outcome},
            transport::{Credential, InboundEvent},
        },
    };

    struct Harness {
        session: SessionManager,
        transport: Arc<MockTransport>,
        router: EventRouter,
    }

    impl Harness {
        async fn new() -> Self {
            let transport = MockTransport::new([Outcome::Connect]);
            let (tx, _rx) = mpsc::channel(16);
            let session = SessionManager::new(transport.clone(), Backoff::default(), tx);
            session.connect(Credential::new("token")).await.unwrap();

            let mut registry = CommandRegistry::new();
            register_builtin(&mut registry, "!").unwrap();
            let router = EventRouter::new(Arc::new(registry), session.clone(), "admin");

            Self {
                session,
                transport,
                router,
            }
        }

        fn link(&self) -> &MockLink {
            &self.transport.link
        }

        async fn send(&self, author: &str, body: &str) -> Option<String> {
            let before = self.link().sent().len();
            self.router
                .on_inbound(InboundEvent::new("chan", author, body))
                .await?
                .await
                .unwrap();

            self.link()
                .sent()
                .get(before)
                .map(|(_, body)| body.clone())
        }
    }

    #[test]
    fn builtins_cannot_be_registered_twice() {
        let mut registry = CommandRegistry::new();
        register_builtin(&mut registry, "!").unwrap();
        let err = register_builtin(&mut registry, "!").unwrap_err();
        assert_eq!(err.token, "!ping");
    }

    #[test]
    fn prefix_is_part_of_the_token() {
        let mut registry = CommandRegistry::new();
        register_builtin(&mut registry, "?").unwrap();
        assert!(registry.resolve("?ping").is_some());
        assert!(registry.resolve("!ping").is_none());
    }

    #[tokio::test]
    async fn ping_replies_pong() {
        let harness = Harness::new().await;
        let reply = harness.send("user1", "!ping").await.unwrap();
        assert!(reply.starts_with("Pong!"));
        harness.session.disconnect().await;
    }

    #[tokio::test]
    async fn uptime_reports_duration() {
        let harness = Harness::new().await;
        let reply = harness.send("user1", "!uptime").await.unwrap();
        assert!(reply.starts_with("Uptime: "));
        harness.session.disconnect().await;
    }

    #[tokio::test]
    async fn help_hides_admin_commands_from_everyone() {
        let harness = Harness::new().await;

        let reply = harness.send("user1", "!help").await.unwrap();
        assert!(reply.contains("!ping"));
        assert!(!reply.contains("!shutdown"));

        let reply = harness.send("admin", "!help").await.unwrap();
        assert!(reply.contains("!shutdown"));
        harness.session.disconnect().await;
    }

    #[tokio::test]
    async fn status_is_admin_only() {
        let harness = Harness::new().await;

        assert!(harness.send("user1", "!status").await.is_none());

        let reply = harness.send("admin", "!status").await.unwrap();
        assert!(reply.contains("connected"));
        assert!(reply.contains("commandbot"));
        harness.session.disconnect().await;
    }

    #[tokio::test]
    async fn presence_updates_session_and_link() {
        let harness = Harness::new().await;

        harness
            .send("admin", "!presence online watching the logs")
            .await
            .unwrap();

        let presence = harness.session.snapshot().await.presence.unwrap();
        assert_eq!(presence.status, Status::Online);
        let activity = presence.activity.unwrap();
        assert_eq!(activity.label, "the logs");
        assert_eq!(harness.link().presences().last().unwrap().status, Status::Online);
        harness.session.disconnect().await;
    }

    #[tokio::test]
    async fn presence_rejects_unknown_status() {
        let harness = Harness::new().await;

        let reply = harness.send("admin", "!presence sleepy").await.unwrap();
        assert!(reply.contains("usage"));
        assert!(harness.session.snapshot().await.presence.is_none());
        harness.session.disconnect().await;
    }

    #[tokio::test]
    async fn shutdown_disconnects_the_session() {
        let harness = Harness::new().await;

        let reply = harness.send("admin", "!shutdown").await.unwrap();
        assert_eq!(reply, "Shutting down.");
        assert_eq!(harness.session.state().await, ConnectionState::Disconnected);
    }
}
