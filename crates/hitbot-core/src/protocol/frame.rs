//! Codec for the socket.io-style text frames exchanged over the websocket.
//!
//! Wire format:
//! ```text
//! 2::                                    heartbeat (echo back verbatim)
//! 1::                                    connect acknowledged
//! 5:::{"name":"message","args":[ARG]}    event
//! ```
//!
//! Event payloads are *double-encoded*: the server sends `ARG` as a JSON
//! string whose content is itself `{"method": ..., "params": {...}}`.  The
//! client sends `ARG` as a plain object.  The decoder accepts both shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{
    EventMessage, EVENT_NAME, METHOD_CHAT_MSG, METHOD_JOIN_CHANNEL, METHOD_LOGIN_MSG,
};

// ── Frame codes ───────────────────────────────────────────────────────────────

/// Prefix of a heartbeat frame.
pub const HEARTBEAT_PREFIX: &str = "2::";

/// Prefix of the connect-acknowledged frame.
pub const CONNECT_ACK_PREFIX: &str = "1::";

/// Prefix of an event frame.
pub const EVENT_PREFIX: &str = "5:::";

/// Errors that can occur while decoding or encoding an event frame.
///
/// A decode error affects only the frame that produced it; callers are
/// expected to log it and carry on with the next frame.
#[derive(Debug, Error)]
pub enum FrameParseError {
    /// The outer `{"name", "args"}` envelope is not valid JSON.
    #[error("malformed event envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The envelope carries no arguments, so there is no method to decode.
    #[error("event envelope has no arguments")]
    MissingArgument,

    /// `args[0]` is not a JSON object or a string containing one.
    #[error("malformed event argument: {0}")]
    Argument(#[source] serde_json::Error),

    /// `params` does not match the record for a known method.
    #[error("malformed params for method '{method}': {source}")]
    Params {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    /// An outbound event could not be serialized.
    #[error("failed to encode '{method}' event: {source}")]
    Encode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

// ── Frame types ───────────────────────────────────────────────────────────────

/// Classification of a raw frame, decided by its literal prefix only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Heartbeat,
    ConnectAck,
    Event,
    Unknown,
}

/// A fully decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Heartbeat,
    ConnectAck,
    Event(EventMessage),
    /// A frame code this client does not handle (disconnect, noop, ...).
    /// Carries the code (text before the first `:`) for logging.
    Unknown(String),
}

#[derive(Deserialize)]
struct InboundEnvelope {
    #[serde(default)]
    args: Vec<Value>,
}

#[derive(Deserialize)]
struct RawEvent {
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Serialize)]
struct OutboundEnvelope<'a, P> {
    name: &'a str,
    args: [OutboundArg<'a, P>; 1],
}

#[derive(Serialize)]
struct OutboundArg<'a, P> {
    method: &'a str,
    params: &'a P,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Classifies a raw frame by its prefix.
///
/// This is a pure function of the leading bytes; the body is not inspected.
///
/// # Examples
///
/// ```rust
/// use hitbot_core::protocol::frame::{classify, FrameKind};
///
/// assert_eq!(classify("2::"), FrameKind::Heartbeat);
/// assert_eq!(classify("1::"), FrameKind::ConnectAck);
/// assert_eq!(classify("5:::{}"), FrameKind::Event);
/// assert_eq!(classify("0::"), FrameKind::Unknown);
/// ```
pub fn classify(raw: &str) -> FrameKind {
    let bytes = raw.as_bytes();
    if bytes.starts_with(HEARTBEAT_PREFIX.as_bytes()) {
        FrameKind::Heartbeat
    } else if bytes.starts_with(CONNECT_ACK_PREFIX.as_bytes()) {
        FrameKind::ConnectAck
    } else if bytes.starts_with(EVENT_PREFIX.as_bytes()) {
        FrameKind::Event
    } else {
        FrameKind::Unknown
    }
}

/// Decodes one raw frame.
///
/// Control frames decode without touching their body.  Event frames go
/// through both JSON layers and the method tag selects the params record.
///
/// # Errors
///
/// Returns [`FrameParseError`] if either JSON layer is malformed or the
/// params of a known method do not match its record.
pub fn decode_frame(raw: &str) -> Result<Frame, FrameParseError> {
    match classify(raw) {
        FrameKind::Heartbeat => Ok(Frame::Heartbeat),
        FrameKind::ConnectAck => Ok(Frame::ConnectAck),
        FrameKind::Event => decode_event(&raw[EVENT_PREFIX.len()..]).map(Frame::Event),
        FrameKind::Unknown => {
            let code = raw.split(':').next().unwrap_or_default();
            Ok(Frame::Unknown(code.to_string()))
        }
    }
}

/// Encodes an outbound event frame for `method` with `params`.
///
/// # Errors
///
/// Returns [`FrameParseError::Encode`] if `params` cannot be serialized.
///
/// # Examples
///
/// ```rust
/// use hitbot_core::protocol::frame::encode_event;
/// use hitbot_core::protocol::messages::ChatMessageParams;
///
/// let params = ChatMessageParams {
///     channel: "general".into(),
///     name: "bot".into(),
///     name_color: "ffffff".into(),
///     text: "hi".into(),
/// };
/// let frame = encode_event("chatMsg", &params).unwrap();
/// assert!(frame.starts_with("5:::"));
/// ```
pub fn encode_event<P: Serialize>(method: &str, params: &P) -> Result<String, FrameParseError> {
    let envelope = OutboundEnvelope {
        name: EVENT_NAME,
        args: [OutboundArg { method, params }],
    };
    let json = serde_json::to_string(&envelope).map_err(|source| FrameParseError::Encode {
        method: method.to_string(),
        source,
    })?;
    Ok(format!("{EVENT_PREFIX}{json}"))
}

// ── Event decoding ────────────────────────────────────────────────────────────

fn decode_event(body: &str) -> Result<EventMessage, FrameParseError> {
    let envelope: InboundEnvelope =
        serde_json::from_str(body).map_err(FrameParseError::Envelope)?;
    let first = envelope
        .args
        .into_iter()
        .next()
        .ok_or(FrameParseError::MissingArgument)?;

    // Inner layer: the server string-encodes the argument.
    let raw: RawEvent = match first {
        Value::String(inner) => serde_json::from_str(&inner),
        other => serde_json::from_value(other),
    }
    .map_err(FrameParseError::Argument)?;

    decode_method(raw)
}

fn decode_method(raw: RawEvent) -> Result<EventMessage, FrameParseError> {
    let RawEvent { method, params } = raw;
    let params = if params.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        params
    };

    let decoded = match method.as_str() {
        METHOD_CHAT_MSG => serde_json::from_value(params).map(EventMessage::ChatMsg),
        METHOD_LOGIN_MSG => serde_json::from_value(params).map(EventMessage::LoginMsg),
        METHOD_JOIN_CHANNEL => serde_json::from_value(params).map(EventMessage::JoinChannel),
        _ => return Ok(EventMessage::Other { method }),
    };
    decoded.map_err(|source| FrameParseError::Params { method, source })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
