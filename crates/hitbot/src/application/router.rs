//! Decides what to do with each inbound text frame.
//!
//! The transport's receive loop calls [`FrameRouter::route`] once per frame
//! and waits for it to return before reading the next one.  Routing is
//! therefore strictly ordered, and a heartbeat is echoed before any later
//! frame is looked at.
//!
//! | Inbound frame            | Action                                   |
//! |--------------------------|------------------------------------------|
//! | heartbeat `2::`          | echo the identical frame                 |
//! | connect ack `1::`        | join every requested channel             |
//! | `chatMsg` event          | hand to the command dispatcher           |
//! | `loginMsg` event         | log the login confirmation               |
//! | any other event / code   | ignore                                   |
//! | undecodable frame        | log at `warn`, skip, keep the session    |

use std::sync::Arc;

use tracing::{debug, info, warn};

use hitbot_core::{
    decode_frame, CommandDispatcher, DispatchOutcome, EventMessage, Frame, ReplySink,
};

use super::composer::MessageComposer;

/// What [`FrameRouter::route`] did with one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The heartbeat was echoed back.
    HeartbeatEchoed,
    /// A join request was queued for each of this many channels.
    ChannelsJoined(usize),
    /// A chat line went through the dispatcher.
    Dispatched(DispatchOutcome),
    /// The server confirmed a login in `channel`.
    LoginConfirmed { channel: String },
    /// The frame needs no action.
    Ignored,
    /// The frame could not be decoded and was dropped.
    Skipped { reason: String },
}

/// Routes decoded frames to the composer and the dispatcher.
pub struct FrameRouter {
    composer: Arc<MessageComposer>,
    replies: Arc<dyn ReplySink>,
    dispatcher: CommandDispatcher,
    channels: Vec<String>,
}

impl FrameRouter {
    /// Creates a router that joins `channels` when the server acknowledges
    /// the connection.  Channels are lowercased and deduplicated.
    pub fn new<I>(composer: Arc<MessageComposer>, dispatcher: CommandDispatcher, channels: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for channel in channels {
            let channel = channel.to_ascii_lowercase();
            if !unique.contains(&channel) {
                unique.push(channel);
            }
        }
        let replies: Arc<dyn ReplySink> = composer.clone();
        Self {
            composer,
            replies,
            dispatcher,
            channels: unique,
        }
    }

    /// Handles one raw text frame.
    pub fn route(&self, raw: &str) -> RouteOutcome {
        let frame = match decode_frame(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("skipping undecodable frame: {e}");
                return RouteOutcome::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        match frame {
            Frame::Heartbeat => {
                self.composer.send_heartbeat(raw);
                RouteOutcome::HeartbeatEchoed
            }
            Frame::ConnectAck => {
                info!("connection acknowledged, joining {} channel(s)", self.channels.len());
                for channel in &self.channels {
                    self.composer.join_channel(channel);
                }
                RouteOutcome::ChannelsJoined(self.channels.len())
            }
            Frame::Event(EventMessage::ChatMsg(chat)) => {
                let outcome = self.dispatcher.dispatch(&chat, &self.replies);
                debug!(channel = %chat.channel, ?outcome, "chat line routed");
                RouteOutcome::Dispatched(outcome)
            }
            Frame::Event(EventMessage::LoginMsg(login)) => {
                info!(
                    "logged in to channel {} as {} (role {})",
                    login.channel, login.name, login.role
                );
                RouteOutcome::LoginConfirmed {
                    channel: login.channel,
                }
            }
            Frame::Event(other) => {
                debug!("ignoring {} event", other.method());
                RouteOutcome::Ignored
            }
            Frame::Unknown(code) => {
                debug!("ignoring frame with control code {code:?}");
                RouteOutcome::Ignored
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
