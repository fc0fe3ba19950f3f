//! Builds outbound event envelopes and queues them for the writer.
//!
//! # How outbound writes work (for beginners)
//!
//! Every frame the bot sends (heartbeat echoes, channel joins, chat replies)
//! ends up on the same websocket.  Two writers racing on one socket would
//! interleave bytes, so nothing here writes to the socket directly.  Instead
//! the composer hands finished frames to a [`FrameSink`], which in production
//! is the transport's outbound queue.  A single writer task drains that queue
//! in order.
//!
//! Sends are fire-and-forget: once the session has closed the queue rejects
//! frames, and the composer just logs that at `debug`.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use hitbot_core::protocol::messages::{
    ChatMessageParams, JoinChannelParams, METHOD_CHAT_MSG, METHOD_JOIN_CHANNEL,
};
use hitbot_core::{encode_event, AuthToken, BotIdentity, ReplySink};

/// Returned by a [`FrameSink`] whose writer has gone away.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("outbound queue is closed")]
pub struct SinkClosed;

/// Accepts finished text frames for delivery.
pub trait FrameSink: Send + Sync {
    /// Queues `frame`.  Must not block.
    ///
    /// # Errors
    ///
    /// Returns [`SinkClosed`] once the session can no longer write.
    fn send_frame(&self, frame: String) -> Result<(), SinkClosed>;
}

/// Composes `joinChannel` and `chatMsg` envelopes on behalf of the bot.
pub struct MessageComposer {
    identity: BotIdentity,
    token: AuthToken,
    sink: Arc<dyn FrameSink>,
}

impl MessageComposer {
    pub fn new(identity: BotIdentity, token: AuthToken, sink: Arc<dyn FrameSink>) -> Self {
        Self {
            identity,
            token,
            sink,
        }
    }

    /// Queues a `joinChannel` request for `channel` (lowercased).
    pub fn join_channel(&self, channel: &str) {
        let params = JoinChannelParams {
            channel: channel.to_ascii_lowercase(),
            name: self.identity.name().to_string(),
            token: self.token.as_str().to_string(),
            is_admin: false,
        };
        self.send_event(METHOD_JOIN_CHANNEL, &params);
    }

    /// Queues a chat line in `channel` (lowercased) under the bot's name and
    /// colour.
    pub fn send_chat(&self, channel: &str, text: &str) {
        let params = ChatMessageParams {
            channel: channel.to_ascii_lowercase(),
            name: self.identity.name().to_string(),
            name_color: self.identity.color().to_string(),
            text: text.to_string(),
        };
        self.send_event(METHOD_CHAT_MSG, &params);
    }

    /// Queues `raw` unchanged.  Used to echo heartbeats.
    pub fn send_heartbeat(&self, raw: &str) {
        self.send_raw(raw.to_string());
    }

    fn send_event<P: Serialize>(&self, method: &str, params: &P) {
        match encode_event(method, params) {
            Ok(frame) => self.send_raw(frame),
            Err(e) => warn!("dropping outbound {method}: {e}"),
        }
    }

    fn send_raw(&self, frame: String) {
        if let Err(e) = self.sink.send_frame(frame) {
            debug!("outbound frame not sent: {e}");
        }
    }
}

impl ReplySink for MessageComposer {
    fn send_chat(&self, channel: &str, text: &str) {
        MessageComposer::send_chat(self, channel, text);
    }

    fn join_channel(&self, channel: &str) {
        MessageComposer::join_channel(self, channel);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
