//! Resolving chat lines into command handler calls.
//!
//! # Dispatch rules
//!
//! For each inbound chat line, in order:
//!
//! 1. Buffered (history replay) lines and empty lines are ignored.
//! 2. Lines that do not start with the `!` marker are ignored.
//! 3. The token after `!` up to the first whitespace is the command; the rest
//!    (leading whitespace removed) is the argument text.
//! 4. The command is looked up in the channel's override table, then in the
//!    global table.
//! 5. The sender must satisfy the registration's required role.
//! 6. The handler is invoked exactly once.
//!
//! None of the rejections is an error: unknown commands, role mismatches and
//! replayed lines are normal traffic in a busy channel.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::registry::{
    CommandContext, CommandRegistry, RegistrationScope, ReplySink,
};
use crate::domain::role::RequiredRole;
use crate::protocol::messages::ChatParams;

/// Leading character that marks chat text as a command.
pub const COMMAND_MARKER: char = '!';

/// What happened to one chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler ran.
    Invoked {
        command: String,
        scope: RegistrationScope,
    },
    /// The line was a history replay.
    Buffered,
    /// The line had no text.
    Empty,
    /// The line did not start with the command marker.
    NotCommand,
    /// No table has the command.
    UnknownCommand { command: String },
    /// The sender lacks the required role.
    Forbidden {
        command: String,
        required: RequiredRole,
    },
}

/// Splits `!command rest of line` into `("command", "rest of line")`.
///
/// Returns `None` if `text` does not start with the marker or the command
/// token is empty.
///
/// # Examples
///
/// ```rust
/// use hitbot_core::domain::dispatch::parse_command;
///
/// assert_eq!(parse_command("!hello world"), Some(("hello", "world")));
/// assert_eq!(parse_command("!hello"), Some(("hello", "")));
/// assert_eq!(parse_command("hello"), None);
/// ```
pub fn parse_command(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_prefix(COMMAND_MARKER)?;
    let (command, args) = match body.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim_start()),
        None => (body, ""),
    };
    if command.is_empty() {
        return None;
    }
    Some((command, args))
}

/// Routes chat lines to registered command handlers.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
    verbose: bool,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self {
            registry,
            verbose: false,
        }
    }

    /// When set, role rejections are logged at `info` instead of `debug`.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Applies the dispatch rules to `event`, invoking at most one handler.
    pub fn dispatch(&self, event: &ChatParams, replies: &Arc<dyn ReplySink>) -> DispatchOutcome {
        if event.is_buffered() {
            return DispatchOutcome::Buffered;
        }
        if event.text.is_empty() {
            return DispatchOutcome::Empty;
        }
        let Some((command, args)) = parse_command(&event.text) else {
            return DispatchOutcome::NotCommand;
        };

        let Some((registration, scope)) = self.registry.resolve(&event.channel, command) else {
            debug!(channel = %event.channel, command, "no handler registered");
            return DispatchOutcome::UnknownCommand {
                command: command.to_string(),
            };
        };

        let required = registration.role();
        if !required.is_satisfied_by(event) {
            if self.verbose {
                info!(
                    channel = %event.channel,
                    sender = %event.name,
                    command,
                    %required,
                    "sender lacks required role"
                );
            } else {
                debug!(channel = %event.channel, sender = %event.name, command, %required, "sender lacks required role");
            }
            return DispatchOutcome::Forbidden {
                command: command.to_string(),
                required,
            };
        }

        debug!(channel = %event.channel, sender = %event.name, command, ?scope, "dispatching command");
        let ctx = CommandContext {
            event,
            command,
            args,
            data: registration.data(),
            replies: Arc::clone(replies),
        };
        registration.handler().handle(&ctx);

        DispatchOutcome::Invoked {
            command: command.to_string(),
            scope,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
