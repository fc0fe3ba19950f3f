//! Command registrations and the traits command handlers implement.
//!
//! A [`CommandRegistry`] holds one *global* table plus one *override* table
//! per channel.  When a command is looked up for a channel, that channel's
//! table is consulted first; the global table is only used when the channel
//! has no entry of that name.
//!
//! # Lifecycle (for beginners)
//!
//! Registrations are collected with a [`CommandRegistryBuilder`] and frozen
//! with [`CommandRegistryBuilder::build`] *before* the session starts reading
//! frames.  The resulting registry is immutable, so it can be shared between
//! tasks behind an `Arc` without any locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::role::RequiredRole;
use crate::protocol::messages::ChatParams;

/// Opaque per-registration configuration handed to the handler on each call.
pub type HandlerData = serde_json::Value;

/// Errors raised while registering commands.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("invalid command name '{0}': must be non-empty and contain no whitespace")]
    InvalidName(String),

    #[error("command '{name}' is already registered ({scope})")]
    Duplicate { name: String, scope: String },
}

// ── Handler-facing traits ─────────────────────────────────────────────────────

/// Outbound path handlers use to talk back to the chat.
///
/// Implementations must not block: sends are queued and written by the
/// session's single writer.
#[cfg_attr(test, mockall::automock)]
pub trait ReplySink: Send + Sync {
    /// Posts `text` to `channel`.
    fn send_chat(&self, channel: &str, text: &str);

    /// Requests to join `channel`.
    fn join_channel(&self, channel: &str);
}

/// Everything a handler receives for one command invocation.
pub struct CommandContext<'a> {
    /// The chat line that triggered the command.
    pub event: &'a ChatParams,
    /// Command token without the `!` marker.
    pub command: &'a str,
    /// Text after the command token, leading whitespace removed.
    pub args: &'a str,
    /// Static data attached at registration time.
    pub data: &'a HandlerData,
    /// Shared so a handler can clone it into a worker task for long jobs.
    pub replies: Arc<dyn ReplySink>,
}

impl CommandContext<'_> {
    /// Replies in the channel the command came from.
    pub fn reply(&self, text: &str) {
        self.replies.send_chat(&self.event.channel, text);
    }
}

/// A command implementation.
///
/// `handle` runs on the session's receive loop.  Heartbeat replies are
/// processed on that same loop, so a handler that needs more than a few
/// milliseconds must hand the work to a separate task and return.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, ctx: &CommandContext<'_>);
}

// ── Registrations ─────────────────────────────────────────────────────────────

/// One command: its handler, the role required to run it, and its data.
#[derive(Clone)]
pub struct CommandRegistration {
    handler: Arc<dyn CommandHandler>,
    role: RequiredRole,
    data: HandlerData,
}

impl CommandRegistration {
    pub fn handler(&self) -> &Arc<dyn CommandHandler> {
        &self.handler
    }

    pub fn role(&self) -> RequiredRole {
        self.role
    }

    pub fn data(&self) -> &HandlerData {
        &self.data
    }
}

impl fmt::Debug for CommandRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistration")
            .field("role", &self.role)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

/// Which table a lookup was answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationScope {
    Channel,
    Global,
}

/// An immutable set of command registrations.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    global: HashMap<String, CommandRegistration>,
    channels: HashMap<String, HashMap<String, CommandRegistration>>,
}

impl CommandRegistry {
    pub fn builder() -> CommandRegistryBuilder {
        CommandRegistryBuilder::default()
    }

    /// Looks `command` up for `channel`: the channel's override table first,
    /// then the global table.
    pub fn resolve(
        &self,
        channel: &str,
        command: &str,
    ) -> Option<(&CommandRegistration, RegistrationScope)> {
        let channel = channel.to_ascii_lowercase();
        if let Some(reg) = self.channels.get(&channel).and_then(|t| t.get(command)) {
            return Some((reg, RegistrationScope::Channel));
        }
        self.global
            .get(command)
            .map(|reg| (reg, RegistrationScope::Global))
    }

    /// Total number of registrations across all tables.
    pub fn len(&self) -> usize {
        self.global.len() + self.channels.values().map(HashMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collects registrations before the session starts.
#[derive(Default)]
pub struct CommandRegistryBuilder {
    registry: CommandRegistry,
}

impl CommandRegistryBuilder {
    /// Registers `name` in the global table.
    ///
    /// A leading `!` on `name` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the name is empty or contains whitespace,
    /// the role is unknown, or the name is already registered globally.
    pub fn register(
        &mut self,
        name: &str,
        handler: Arc<dyn CommandHandler>,
        role: &str,
        data: HandlerData,
    ) -> Result<&mut Self, RegistryError> {
        let (name, registration) = prepare(name, handler, role, data)?;
        insert(&mut self.registry.global, name, registration, "global")?;
        Ok(self)
    }

    /// Registers `name` in `channel`'s override table.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register), with duplicates checked within
    /// the channel's table only.
    pub fn register_for_channel(
        &mut self,
        channel: &str,
        name: &str,
        handler: Arc<dyn CommandHandler>,
        role: &str,
        data: HandlerData,
    ) -> Result<&mut Self, RegistryError> {
        let (name, registration) = prepare(name, handler, role, data)?;
        let channel = channel.to_ascii_lowercase();
        let scope = format!("channel {channel}");
        let table = self.registry.channels.entry(channel).or_default();
        insert(table, name, registration, &scope)?;
        Ok(self)
    }

    /// Freezes the registrations.
    pub fn build(self) -> CommandRegistry {
        self.registry
    }
}

fn prepare(
    name: &str,
    handler: Arc<dyn CommandHandler>,
    role: &str,
    data: HandlerData,
) -> Result<(String, CommandRegistration), RegistryError> {
    let bare = name.strip_prefix(crate::domain::dispatch::COMMAND_MARKER).unwrap_or(name);
    if bare.is_empty() || bare.chars().any(char::is_whitespace) {
        return Err(RegistryError::InvalidName(name.to_string()));
    }
    let role = role.parse::<RequiredRole>()?;
    Ok((
        bare.to_string(),
        CommandRegistration {
            handler,
            role,
            data,
        },
    ))
}

fn insert(
    table: &mut HashMap<String, CommandRegistration>,
    name: String,
    registration: CommandRegistration,
    scope: &str,
) -> Result<(), RegistryError> {
    if table.contains_key(&name) {
        return Err(RegistryError::Duplicate {
            name,
            scope: scope.to_string(),
        });
    }
    table.insert(name, registration);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopHandler;

    impl CommandHandler for NoopHandler {
        fn handle(&self, _ctx: &CommandContext<'_>) {}
    }

    fn noop() -> Arc<dyn CommandHandler> {
        Arc::new(NoopHandler)
    }

    #[test]
    fn test_resolve_global_registration() {
        // Arrange
        let mut builder = CommandRegistry::builder();
        builder
            .register("hello", noop(), "anon", serde_json::json!({"text": "hi"}))
            .unwrap();
        let registry = builder.build();

        // Act
        let (reg, scope) = registry.resolve("general", "hello").unwrap();

        // Assert
        assert_eq!(scope, RegistrationScope::Global);
        assert_eq!(reg.role(), RequiredRole::Anon);
        assert_eq!(reg.data()["text"], "hi");
    }

    #[test]
    fn test_channel_override_takes_precedence() {
        let mut builder = CommandRegistry::builder();
        builder
            .register("hello", noop(), "anon", HandlerData::Null)
            .unwrap()
            .register_for_channel("General", "hello", noop(), "admin", HandlerData::Null)
            .unwrap();
        let registry = builder.build();

        let (reg, scope) = registry.resolve("general", "hello").unwrap();
        assert_eq!(scope, RegistrationScope::Channel);
        assert_eq!(reg.role(), RequiredRole::Admin);
    }

    #[test]
    fn test_override_does_not_leak_to_other_channels() {
        let mut builder = CommandRegistry::builder();
        builder
            .register_for_channel("x", "only", noop(), "anon", HandlerData::Null)
            .unwrap();
        let registry = builder.build();

        assert!(registry.resolve("x", "only").is_some());
        assert!(registry.resolve("y", "only").is_none());
    }

    #[test]
    fn test_leading_marker_is_stripped_from_name() {
        let mut builder = CommandRegistry::builder();
        builder
            .register("!ping", noop(), "anon", HandlerData::Null)
            .unwrap();
        let registry = builder.build();
        assert!(registry.resolve("any", "ping").is_some());
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let mut builder = CommandRegistry::builder();
        assert!(matches!(
            builder.register("", noop(), "anon", HandlerData::Null),
            Err(RegistryError::InvalidName(_))
        ));
        assert!(matches!(
            builder.register("!", noop(), "anon", HandlerData::Null),
            Err(RegistryError::InvalidName(_))
        ));
        assert!(matches!(
            builder.register("two words", noop(), "anon", HandlerData::Null),
            Err(RegistryError::InvalidName(_))
        ));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let mut builder = CommandRegistry::builder();
        let result = builder.register("hello", noop(), "emperor", HandlerData::Null);
        assert!(matches!(result, Err(RegistryError::UnknownRole(role)) if role == "emperor"));
    }

    #[test]
    fn test_duplicate_in_same_scope_is_rejected() {
        let mut builder = CommandRegistry::builder();
        builder
            .register("hello", noop(), "anon", HandlerData::Null)
            .unwrap();
        let result = builder.register("hello", noop(), "anon", HandlerData::Null);
        assert!(matches!(result, Err(RegistryError::Duplicate { .. })));
    }

    #[test]
    fn test_same_name_global_and_channel_is_allowed() {
        let mut builder = CommandRegistry::builder();
        builder
            .register("hello", noop(), "anon", HandlerData::Null)
            .unwrap();
        builder
            .register_for_channel("x", "hello", noop(), "anon", HandlerData::Null)
            .unwrap();
        assert_eq!(builder.build().len(), 2);
    }

    #[test]
    fn test_empty_registry() {
        let registry = CommandRegistry::builder().build();
        assert!(registry.is_empty());
        assert!(registry.resolve("x", "hello").is_none());
    }
}
