//! Configuration schema for the bot.
//!
//! The file is TOML and maps onto [`BotConfig`]:
//!
//! ```toml
//! [bot]
//! name = "mybot"
//! color = "ffffff"
//! channels = ["general"]
//!
//! [api]
//! base_url = "http://api.hitbox.tv"
//!
//! [[commands]]
//! name = "hello"
//! handler = "reply"
//! role = "anon"
//! data = { text = "hi {name}" }
//!
//! [[commands]]
//! name = "hello"
//! channel = "general"
//! handler = "echo"
//! role = "follower"
//! ```
//!
//! # Serde default values
//!
//! Every field except `bot.name` has a default, so a config that only names
//! the bot is valid.  A `[[commands]]` entry with a `channel` key is a
//! per-channel override; without one it goes in the global table.
//!
//! Reading the file from disk is the infrastructure layer's job; this module
//! only describes the shape.

use serde::Deserialize;

/// Base URL of the chat API used when `[api]` is absent.
pub const DEFAULT_API_BASE: &str = "http://api.hitbox.tv";

/// `tracing` filter used when `bot.log_level` is absent.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BotConfig {
    pub bot: BotSettings,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub commands: Vec<CommandEntry>,
}

/// Identity and behaviour of the bot account.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BotSettings {
    /// Login name; also the name shown next to the bot's chat lines.
    pub name: String,
    /// Name colour as six hex digits, with or without a leading `#`.
    #[serde(default = "default_color")]
    pub color: String,
    /// Logs role rejections and probe results at `info` instead of `debug`.
    #[serde(default)]
    pub verbose: bool,
    /// Channels to join once the server acknowledges the connection.
    #[serde(default)]
    pub channels: Vec<String>,
    /// `tracing` filter: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Where the HTTP API lives.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Serves `/chat/servers.json` and `/auth/token`.
    #[serde(default = "default_api_base")]
    pub base_url: String,
}

/// One `[[commands]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CommandEntry {
    /// Command name, with or without the leading `!`.
    pub name: String,
    /// Handler kind, e.g. `"reply"` or `"echo"`.
    pub handler: String,
    /// Role required to run the command.
    #[serde(default = "default_role")]
    pub role: String,
    /// Restricts the entry to one channel, overriding any global entry there.
    #[serde(default)]
    pub channel: Option<String>,
    /// Static data handed to the handler on every invocation.
    #[serde(default)]
    pub data: serde_json::Value,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_color() -> String {
    hitbot_core::domain::identity::DEFAULT_NAME_COLOR.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
fn default_role() -> String {
    "anon".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
        }
    }
}

impl BotConfig {
    /// Adds channels given on the command line after the configured ones.
    pub fn extend_channels<I>(&mut self, extra: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.bot.channels.extend(extra);
    }

    /// Requested channels, lowercased, without duplicates, in config order.
    pub fn requested_channels(&self) -> Vec<String> {
        let mut seen = Vec::with_capacity(self.bot.channels.len());
        for channel in &self.bot.channels {
            let channel = channel.trim().to_ascii_lowercase();
            if !channel.is_empty() && !seen.contains(&channel) {
                seen.push(channel);
            }
        }
        seen
    }

    /// Filter directive for the log subscriber.
    ///
    /// A verbose bot with the default level logs at `debug`.
    pub fn log_filter(&self) -> &str {
        if self.bot.verbose && self.bot.log_level == DEFAULT_LOG_LEVEL {
            "debug"
        } else {
            &self.bot.log_level
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
