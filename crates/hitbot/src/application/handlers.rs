//! Built-in handler kinds and building a registry from config entries.
//!
//! A `[[commands]]` entry names a handler *kind* rather than code.  The kind
//! is looked up in [`HandlerKinds`], and the entry's `data` table is attached
//! to the registration so one kind can back many commands.
//!
//! | Kind    | Behaviour                                                     |
//! |---------|---------------------------------------------------------------|
//! | `reply` | Sends `data.text`, with `{name}` and `{args}` substituted.    |
//! | `echo`  | Sends the argument text back; nothing when there is none.     |

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use hitbot_core::{CommandContext, CommandHandler, CommandRegistry, RegistryError};

use crate::domain::config::CommandEntry;

/// Errors raised while turning config entries into registrations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryBuildError {
    #[error("command '{command}' uses unknown handler kind '{kind}'")]
    UnknownHandler { command: String, kind: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

// ── Handler kinds ─────────────────────────────────────────────────────────────

/// Replies with a fixed template from `data.text`.
pub struct ReplyHandler;

impl CommandHandler for ReplyHandler {
    fn handle(&self, ctx: &CommandContext<'_>) {
        let Some(template) = ctx.data.get("text").and_then(|v| v.as_str()) else {
            warn!("reply command '{}' has no data.text", ctx.command);
            return;
        };
        let text = template
            .replace("{name}", &ctx.event.name)
            .replace("{args}", ctx.args);
        ctx.reply(&text);
    }
}

/// Repeats the command's argument text.
pub struct EchoHandler;

impl CommandHandler for EchoHandler {
    fn handle(&self, ctx: &CommandContext<'_>) {
        if !ctx.args.is_empty() {
            ctx.reply(ctx.args);
        }
    }
}

/// Maps handler kind names to shared handler instances.
#[derive(Default)]
pub struct HandlerKinds {
    kinds: HashMap<String, Arc<dyn CommandHandler>>,
}

impl HandlerKinds {
    /// The kinds shipped with the binary: `reply` and `echo`.
    pub fn builtin() -> Self {
        let mut kinds = Self::default();
        kinds.insert("reply", Arc::new(ReplyHandler));
        kinds.insert("echo", Arc::new(EchoHandler));
        kinds
    }

    /// Adds or replaces a kind.
    pub fn insert(&mut self, kind: &str, handler: Arc<dyn CommandHandler>) {
        self.kinds.insert(kind.to_string(), handler);
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn CommandHandler>> {
        self.kinds.get(kind).cloned()
    }

    /// Builds an immutable registry from config entries.
    ///
    /// Entries with a `channel` become per-channel overrides.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryBuildError::UnknownHandler`] for a kind that is not
    /// registered here, or [`RegistryBuildError::Registry`] for a bad name,
    /// unknown role or duplicate.
    pub fn build_registry(&self, entries: &[CommandEntry]) -> Result<CommandRegistry, RegistryBuildError> {
        let mut builder = CommandRegistry::builder();
        for entry in entries {
            let handler = self
                .get(&entry.handler)
                .ok_or_else(|| RegistryBuildError::UnknownHandler {
                    command: entry.name.clone(),
                    kind: entry.handler.clone(),
                })?;
            match &entry.channel {
                Some(channel) => builder.register_for_channel(
                    channel,
                    &entry.name,
                    handler,
                    &entry.role,
                    entry.data.clone(),
                )?,
                None => builder.register(&entry.name, handler, &entry.role, entry.data.clone())?,
            };
        }
        Ok(builder.build())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use hitbot_core::{ChatParams, HandlerData, ReplySink};

    #[derive(Default)]
    struct Replies(Mutex<Vec<(String, String)>>);

    impl ReplySink for Replies {
        fn send_chat(&self, channel: &str, text: &str) {
            self.0.lock().unwrap().push((channel.into(), text.into()));
        }
        fn join_channel(&self, _channel: &str) {}
    }

    fn invoke(handler: &dyn CommandHandler, args: &str, data: &HandlerData) -> Vec<(String, String)> {
        let replies = Arc::new(Replies::default());
        let event = ChatParams {
            channel: "general".to_string(),
            name: "alice".to_string(),
            ..Default::default()
        };
        let ctx = CommandContext {
            event: &event,
            command: "cmd",
            args,
            data,
            replies: replies.clone(),
        };
        handler.handle(&ctx);
        let sent = replies.0.lock().unwrap().clone();
        sent
    }

    fn entry(name: &str, handler: &str, channel: Option<&str>) -> CommandEntry {
        CommandEntry {
            name: name.to_string(),
            handler: handler.to_string(),
            role: "anon".to_string(),
            channel: channel.map(str::to_string),
            data: serde_json::json!({ "text": "hi" }),
        }
    }

    #[test]
    fn test_reply_substitutes_name_and_args() {
        // Arrange
        let data = serde_json::json!({ "text": "hi {name}, you said {args}" });

        // Act
        let sent = invoke(&ReplyHandler, "hello", &data);

        // Assert
        assert_eq!(
            sent,
            vec![("general".to_string(), "hi alice, you said hello".to_string())]
        );
    }

    #[test]
    fn test_reply_without_text_sends_nothing() {
        let sent = invoke(&ReplyHandler, "", &HandlerData::Null);
        assert!(sent.is_empty());
    }

    #[test]
    fn test_echo_repeats_args_and_ignores_empty() {
        assert_eq!(
            invoke(&EchoHandler, "say this", &HandlerData::Null),
            vec![("general".to_string(), "say this".to_string())]
        );
        assert!(invoke(&EchoHandler, "", &HandlerData::Null).is_empty());
    }

    #[test]
    fn test_build_registry_places_overrides_per_channel() {
        let kinds = HandlerKinds::builtin();
        let entries = vec![
            entry("hello", "reply", None),
            entry("hello", "echo", Some("General")),
        ];

        let registry = kinds.build_registry(&entries).unwrap();

        assert_eq!(registry.len(), 2);
        let (_, scope) = registry.resolve("general", "hello").unwrap();
        assert_eq!(scope, hitbot_core::RegistrationScope::Channel);
        let (_, scope) = registry.resolve("music", "hello").unwrap();
        assert_eq!(scope, hitbot_core::RegistrationScope::Global);
    }

    #[test]
    fn test_build_registry_rejects_unknown_kind() {
        let kinds = HandlerKinds::builtin();

        let result = kinds.build_registry(&[entry("dance", "shuffle", None)]);

        assert_eq!(
            result.err(),
            Some(RegistryBuildError::UnknownHandler {
                command: "dance".to_string(),
                kind: "shuffle".to_string(),
            })
        );
    }

    #[test]
    fn test_build_registry_propagates_unknown_role() {
        let kinds = HandlerKinds::builtin();
        let mut bad = entry("hello", "reply", None);
        bad.role = "wizard".to_string();

        let result = kinds.build_registry(&[bad]);

        assert_eq!(
            result.err(),
            Some(RegistryBuildError::Registry(RegistryError::UnknownRole(
                "wizard".to_string()
            )))
        );
    }
}
