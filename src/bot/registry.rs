use std::{fmt, future::Future, sync::Arc};

use async_trait::async_trait;
use indexmap::{IndexMap, map::Entry};

use super::error::{DuplicateCommandError, HandlerResult};
use crate::session::{SessionManager, transport::InboundEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PermissionLevel {
    Everyone,
    Admin,
}

/// Everything a handler gets to work with for one invocation.
pub struct CommandContext {
    pub event: InboundEvent,
    pub args: Vec<String>,
    pub level: PermissionLevel,
    pub session: SessionManager,
    pub registry: Arc<CommandRegistry>,
}

impl CommandContext {
    /// Replies in the channel the command came from.
    pub async fn reply(&self, body: impl AsRef<str>) -> HandlerResult {
        self.session
            .send_message(&self.event.source_id, body.as_ref())
            .await?;

        Ok(())
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn call(&self, ctx: CommandContext) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(CommandContext) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, ctx: CommandContext) -> HandlerResult {
        (self)(ctx).await
    }
}

#[derive(Clone)]
pub struct CommandEntry {
    pub token: String,
    pub handler: Arc<dyn CommandHandler>,
    pub permission: PermissionLevel,
    pub description: Option<String>,
}

impl CommandEntry {
    pub fn describe(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("token", &self.token)
            .field("permission", &self.permission)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Token to handler table. Tokens are matched exactly, case included, and
/// iteration follows registration order.
#[derive(Default)]
pub struct CommandRegistry {
    commands: IndexMap<String, CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        token: impl Into<String>,
        handler: impl CommandHandler + 'static,
        permission: PermissionLevel,
    ) -> Result<&mut CommandEntry, DuplicateCommandError> {
        match self.commands.entry(token.into()) {
            Entry::Occupied(entry) => Err(DuplicateCommandError {
                token: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                let token = entry.key().clone();
                Ok(entry.insert(CommandEntry {
                    token,
                    handler: Arc::new(handler),
                    permission,
                    description: None,
                }))
            }
        }
    }

    pub fn resolve(&self, token: &str) -> Option<&CommandEntry> {
        self.commands.get(token)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CommandEntry> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop(_ctx: CommandContext) -> HandlerResult {
        Ok(())
    }

    #[test]
    fn duplicate_registration_keeps_first_entry() {
        let mut registry = CommandRegistry::new();
        registry
            .register("!ping", noop, PermissionLevel::Everyone)
            .unwrap()
            .describe("first");

        let err = registry
            .register("!ping", noop, PermissionLevel::Admin)
            .unwrap_err();
        assert_eq!(err.token, "!ping");

        let entry = registry.resolve("!ping").unwrap();
        assert_eq!(entry.permission, PermissionLevel::Everyone);
        assert_eq!(entry.description.as_deref(), Some("first"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn tokens_are_case_sensitive() {
        let mut registry = CommandRegistry::new();
        registry
            .register("!ping", noop, PermissionLevel::Everyone)
            .unwrap();
        registry
            .register("!PING", noop, PermissionLevel::Everyone)
            .unwrap();

        assert!(registry.resolve("!ping").is_some());
        assert!(registry.resolve("!PING").is_some());
        assert!(registry.resolve("!Ping").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn entries_follow_registration_order() {
        let mut registry = CommandRegistry::new();
        for token in ["!b", "!a", "!c"] {
            registry
                .register(token, noop, PermissionLevel::Everyone)
                .unwrap();
        }

        let tokens: Vec<_> = registry.entries().map(|e| e.token.as_str()).collect();
        assert_eq!(tokens, ["!b", "!a", "!c"]);
    }

    #[test]
    fn admin_outranks_everyone() {
        assert!(PermissionLevel::Admin > PermissionLevel::Everyone);
    }
}
