//! hitbot library crate.
//!
//! This crate connects a bot account to the chat service, keeps the session
//! alive, and answers `!commands` typed in the channels it joined.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Chat API (HTTP)              Chat server (socket.io frames over WebSocket)
//!        ↕                                 ↕
//! [hitbot]
//!   ├── domain/           Config schema (bot, api, commands)
//!   ├── application/      Frame routing, outbound composition, handler kinds
//!   └── infrastructure/
//!         ├── discovery/  Server list + session-id probe (reqwest)
//!         ├── auth/       Token exchange (reqwest)
//!         ├── transport/  WebSocket session + writer task (tokio-tungstenite)
//!         ├── config/     Loading the TOML file from disk
//!         └── bot/        Startup sequence tying it all together
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O; it only describes what a config file may contain.
//! - `application` depends on `domain` and `hitbot-core` only.  It writes
//!   frames through the [`application::FrameSink`] trait and never touches a
//!   socket.
//! - `infrastructure` depends on all other layers plus `tokio`, `reqwest` and
//!   `tokio-tungstenite`.
//!
//! # For beginners: why this structure?
//!
//! The interesting rules (what to do with a heartbeat, who may run a command,
//! what a join envelope looks like) live in `hitbot-core` and `application`,
//! where they can be tested with an in-memory sink.  The infrastructure layer
//! only moves bytes, so swapping the HTTP client or the websocket library
//! would not touch the bot's behaviour.

/// Domain layer: configuration schema types (no I/O).
pub mod domain;

/// Application layer: frame routing and outbound message composition.
pub mod application;

/// Infrastructure layer: HTTP discovery and auth, websocket transport, startup.
pub mod infrastructure;
