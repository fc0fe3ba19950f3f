//! Domain layer for hitbot.
//!
//! Only the configuration schema lives here.  The protocol and command rules
//! are pure as well but are shared through `hitbot-core`.
//!
//! # What does NOT belong here?
//!
//! - File I/O (see `infrastructure::config`)
//! - HTTP or websocket types

pub mod config;

pub use config::{ApiConfig, BotConfig, BotSettings, CommandEntry};
