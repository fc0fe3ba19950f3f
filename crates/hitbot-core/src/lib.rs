//! # hitbot-core
//!
//! Shared library for the hitbot chat client containing the wire framing
//! codec, the typed event messages, and the command registry/dispatcher.
//!
//! This crate has zero dependencies on sockets, HTTP clients, or async
//! runtimes.  Everything here is a pure function of its inputs, which keeps
//! the protocol rules and the dispatch rules testable without a network.
//!
//! # Architecture overview (for beginners)
//!
//! The chat service speaks a socket.io-style protocol over a websocket.  Every
//! websocket text message is a *frame* that starts with a short ASCII control
//! code (`2::` heartbeat, `1::` connect acknowledged, `5:::` event).  Event
//! frames carry a JSON envelope whose first argument is *itself* JSON, naming
//! a `method` (`chatMsg`, `joinChannel`, `loginMsg`) and its `params`.
//!
//! - **`protocol`** – How frames travel over the wire.  Raw text is classified
//!   by prefix and event payloads are decoded into a strongly-typed
//!   [`EventMessage`] sum type; outbound events are encoded the same way.
//!
//! - **`domain`** – Pure bot logic: the bot's identity, the command registry
//!   (global table plus per-channel overrides), role gating, and the
//!   dispatcher that turns `!command args` chat text into a handler call.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `hitbot_core::CommandRegistry` instead of the full module path.
pub use domain::dispatch::{CommandDispatcher, DispatchOutcome, COMMAND_MARKER};
pub use domain::identity::{AuthToken, BotIdentity, IdentityError};
pub use domain::registry::{
    CommandContext, CommandHandler, CommandRegistration, CommandRegistry, CommandRegistryBuilder,
    HandlerData, RegistrationScope, RegistryError, ReplySink,
};
pub use domain::role::RequiredRole;
pub use protocol::frame::{classify, decode_frame, encode_event, Frame, FrameKind, FrameParseError};
pub use protocol::messages::{ChatMessageParams, ChatParams, EventMessage, JoinChannelParams, LoginParams};
