//! Application layer for hitbot.
//!
//! The application layer knows *what* the bot does with each frame but
//! delegates *how* bytes move to the infrastructure layer.
//!
//! # Responsibilities
//!
//! - Routing inbound frames (heartbeat echo, channel joins, command dispatch)
//! - Composing outbound `joinChannel` / `chatMsg` envelopes
//! - The built-in handler kinds and building a registry from config
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or HTTP requests (that is infrastructure)
//! - Spawning tasks (the writer task lives in the transport)

pub mod composer;
pub mod handlers;
pub mod router;

pub use composer::{FrameSink, MessageComposer, SinkClosed};
pub use handlers::{EchoHandler, HandlerKinds, RegistryBuildError, ReplyHandler};
pub use router::{FrameRouter, RouteOutcome};
