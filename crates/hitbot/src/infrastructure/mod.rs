//! Infrastructure layer for hitbot.
//!
//! The infrastructure layer handles all I/O.
//!
//! # Responsibilities
//!
//! - Fetching the server list and probing for a session id (`discovery`)
//! - Exchanging the credential for a token (`auth`)
//! - Dialling the websocket and running the writer task and receive loop
//!   (`transport`)
//! - Reading the config file (`config`)
//! - Running the startup sequence (`bot`)
//!
//! # What does NOT belong here?
//!
//! - Deciding what to do with a frame (that is `application::router`)
//! - Envelope layouts (that is `hitbot-core` and `application::composer`)

pub mod auth;
pub mod bot;
pub mod config;
pub mod discovery;
pub mod transport;

pub use auth::{AuthContext, AuthenticationFailure};
pub use bot::{Bot, BotError};
pub use config::{load_config, ConfigError};
pub use discovery::{SelectionError, Server, ServerSelection, ServerSelector};
pub use transport::{websocket_url, Outbox, SessionEnd, SessionError, SessionState, TransportSession};
