//! hitbot chat bot: entry point.
//!
//! Logs a bot account into the chat service, joins the configured channels,
//! answers heartbeats, and runs `!commands` typed by other users.
//!
//! # Usage
//!
//! ```text
//! hitbot [OPTIONS] --password <PASSWORD>
//!
//! Options:
//!   --config   <PATH>      Config file [default: hitbot.toml]
//!   --password <PASSWORD>  Account password
//!   --channel  <NAME>      Extra channel to join (repeatable)
//!   --verbose              Log role rejections and server selection at info
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable          | Description                         |
//! |-------------------|-------------------------------------|
//! | `HITBOT_CONFIG`   | Config file path                    |
//! | `HITBOT_PASSWORD` | Account password                    |
//! | `RUST_LOG`        | Log filter; overrides `log_level`   |
//!
//! # Architecture overview
//!
//! ```text
//! chat API (HTTP) ── discovery + auth ──┐
//!                                       ▼
//! chat server (WebSocket) ◀──▶ transport ──▶ router ──▶ dispatcher ──▶ handlers
//!                                  ▲                                      │
//!                                  └──────── outbox ◀── composer ◀────────┘
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hitbot::application::HandlerKinds;
use hitbot::domain::BotConfig;
use hitbot::infrastructure::{load_config, Bot};
use hitbot_core::BotIdentity;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// hitbot chat bot.
#[derive(Debug, Parser)]
#[command(name = "hitbot", about = "Chat bot client for socket.io chat servers", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "hitbot.toml", env = "HITBOT_CONFIG")]
    config: PathBuf,

    /// Password for the bot account.
    ///
    /// Prefer the environment variable so the password does not show up in
    /// the process list.
    #[arg(long, env = "HITBOT_PASSWORD", hide_env_values = true)]
    password: String,

    /// Channel to join in addition to those in the config file.
    #[arg(long = "channel", value_name = "NAME")]
    channels: Vec<String>,

    /// Forces verbose logging on, regardless of the config file.
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    /// Loads the config file and applies the command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    fn into_bot_config(self) -> anyhow::Result<(BotConfig, String)> {
        let mut config = load_config(&self.config)
            .with_context(|| format!("loading config from {}", self.config.display()))?;
        apply_overrides(&mut config, self.channels, self.verbose);
        Ok((config, self.password))
    }
}

fn apply_overrides(config: &mut BotConfig, channels: Vec<String>, verbose: bool) {
    config.extend_channels(channels);
    config.bot.verbose |= verbose;
}

/// Builds the bot from a validated config.
fn build_bot(config: &BotConfig) -> anyhow::Result<Bot> {
    let mut identity = BotIdentity::new(config.bot.name.clone(), config.bot.verbose)
        .context("invalid [bot] name")?;
    identity
        .set_color(&config.bot.color)
        .context("invalid [bot] color")?;

    let registry = HandlerKinds::builtin()
        .build_registry(&config.commands)
        .context("invalid [[commands]] entry")?;

    Ok(Bot::new(
        identity,
        config.api.base_url.clone(),
        config.requested_channels(),
        registry,
    ))
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. CLI arguments are parsed and the config file is loaded.
/// 2. `tracing_subscriber` is initialised.  `RUST_LOG` wins; otherwise the
///    configured `log_level` applies.
/// 3. The identity and the command registry are built; a bad colour, role or
///    handler kind stops the program here.
/// 4. [`Bot::run`] selects a server, authenticates and serves the session
///    until it ends or Ctrl+C is pressed.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, password) = cli.into_bot_config()?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();

    let bot = build_bot(&config)?;
    info!(
        "hitbot starting as {}, api={}",
        config.bot.name, config.api.base_url
    );

    // Dropping the run future on Ctrl+C closes the socket.
    tokio::select! {
        result = bot.run(&password) => {
            match result {
                Ok(end) => info!("session over: {end:?}"),
                Err(e) => {
                    error!("bot stopped: {e}");
                    return Err(e.into());
                }
            }
        }
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("received Ctrl+C, shutting down"),
                Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
            }
        }
    }

    info!("hitbot stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
