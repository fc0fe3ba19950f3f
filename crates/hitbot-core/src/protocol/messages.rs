//! Typed event messages carried inside `5:::` event frames.
//!
//! Every event frame names a `method` and carries a `params` object whose
//! shape depends on the method.  Rather than passing an untyped JSON map
//! around, the codec decodes the method tag first and then parses `params`
//! into the record for that method, producing an [`EventMessage`].

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Outer envelope `name` used for every event the client sends.
pub const EVENT_NAME: &str = "message";

/// Method tag: request to join a channel (client → server).
pub const METHOD_JOIN_CHANNEL: &str = "joinChannel";

/// Method tag: a chat line (both directions).
pub const METHOD_CHAT_MSG: &str = "chatMsg";

/// Method tag: login confirmation (server → client).
pub const METHOD_LOGIN_MSG: &str = "loginMsg";

/// Role string the server assigns to channel administrators/moderators.
pub const ADMIN_ROLE: &str = "admin";

// ── Inbound sum type ──────────────────────────────────────────────────────────

/// A decoded event, one variant per known method.
#[derive(Debug, Clone, PartialEq)]
pub enum EventMessage {
    /// `joinChannel` echoed back by the server.
    JoinChannel(JoinChannelParams),
    /// `chatMsg`: a line of chat; the only event that can trigger a command.
    ChatMsg(ChatParams),
    /// `loginMsg`: the server confirms the bot joined a channel.
    LoginMsg(LoginParams),
    /// Any method this client does not know.  Not an error: the server adds
    /// methods over time (user lists, polls, ...) and they are simply ignored.
    Other { method: String },
}

impl EventMessage {
    /// Returns the wire method tag for this event.
    pub fn method(&self) -> &str {
        match self {
            EventMessage::JoinChannel(_) => METHOD_JOIN_CHANNEL,
            EventMessage::ChatMsg(_) => METHOD_CHAT_MSG,
            EventMessage::LoginMsg(_) => METHOD_LOGIN_MSG,
            EventMessage::Other { method } => method,
        }
    }
}

// ── Per-method parameter records ──────────────────────────────────────────────

/// Parameters of an inbound `chatMsg` event.
///
/// Every field has a default because the server omits fields that do not
/// apply (e.g. `image` for plain text lines).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatParams {
    /// Channel the line was posted in.
    pub channel: String,
    /// Display name of the sender.
    pub name: String,
    /// Sender's name colour (hex, no `#`).
    pub name_color: String,
    /// The chat text.
    pub text: String,
    /// Unix timestamp (seconds) assigned by the server.
    pub time: i64,
    /// Sender role in this channel (`"anon"`, `"user"`, `"admin"`).
    pub role: String,
    pub is_follower: bool,
    pub is_subscriber: bool,
    pub is_owner: bool,
    pub is_staff: bool,
    pub is_community: bool,
    /// `true` when the line embeds media.
    pub media: bool,
    pub image: Option<String>,
    /// Replayed from the channel history buffer.
    pub buffer: bool,
    /// Sent as part of a history buffer flush.
    #[serde(rename = "buffersent")]
    pub buffer_sent: bool,
}

impl ChatParams {
    /// `true` when this line is a replay of channel history rather than a
    /// live message.  Buffered lines never trigger commands.
    pub fn is_buffered(&self) -> bool {
        self.buffer || self.buffer_sent
    }

    /// `true` when the sender has moderator-level rights in the channel.
    pub fn is_admin_level(&self) -> bool {
        self.role.eq_ignore_ascii_case(ADMIN_ROLE) || self.is_owner || self.is_staff
    }
}

/// Parameters of a `joinChannel` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinChannelParams {
    /// Lowercase channel name.
    pub channel: String,
    /// Bot login name.
    pub name: String,
    /// Auth token obtained from the token endpoint.
    pub token: String,
    pub is_admin: bool,
}

/// Parameters of an inbound `loginMsg` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginParams {
    pub channel: String,
    pub name: String,
    pub role: String,
}

/// Parameters of an outbound `chatMsg` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageParams {
    pub channel: String,
    pub name: String,
    pub name_color: String,
    pub text: String,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
