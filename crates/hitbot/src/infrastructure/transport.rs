//! WebSocket transport for one chat session.
//!
//! # Session lifecycle
//!
//! ```text
//!  Idle ──connect()──▶ Connecting ──ok──▶ Open ──run() ends──▶ Closed
//!                           │
//!                           └──dial error──▶ Closed
//! ```
//!
//! # Reads and writes (for beginners)
//!
//! After the handshake the websocket is split into a read half and a write
//! half.
//!
//! - The **write half** is moved into a dedicated *writer task*.  Everything
//!   the bot sends (heartbeat echoes, joins, chat replies) is pushed onto an
//!   unbounded queue through an [`Outbox`], and the writer task sends the
//!   queued frames one at a time in order.  No other code touches the sink.
//! - The **read half** stays with [`TransportSession::run`], which reads one
//!   message, hands it to the [`FrameRouter`] and only then reads the next.
//!
//! Pushing onto the queue never blocks, so a handler replying from inside the
//! receive loop cannot deadlock against the writer.  There are no timeouts.
//! The receive loop also watches the writer task: once the writer stops,
//! whether after [`Outbox::close`] or because a send failed, the loop ends
//! without waiting for the peer.  Otherwise the session lasts until the peer
//! closes it or a read fails.

use std::fmt::Display;

use futures_util::stream::SplitStream;
use futures_util::{Sink, SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::application::composer::{FrameSink, SinkClosed};
use crate::application::router::FrameRouter;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Builds the websocket URL for a server and handshake session id.
///
/// # Examples
///
/// ```rust
/// use hitbot::infrastructure::transport::websocket_url;
///
/// assert_eq!(
///     websocket_url("chat.example:8080", "abc"),
///     "ws://chat.example:8080/socket.io/1/websocket/abc"
/// );
/// ```
pub fn websocket_url(server: &str, session_id: &str) -> String {
    format!("ws://{server}/socket.io/1/websocket/{session_id}")
}

/// Where a [`TransportSession`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Closed,
}

/// Errors raised by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to open websocket {url}: {source}")]
    Dial {
        url: String,
        #[source]
        source: WsError,
    },

    #[error("cannot connect a session in state {0:?}")]
    AlreadyStarted(SessionState),

    #[error("cannot run a session in state {0:?}")]
    NotOpen(SessionState),
}

/// Why the receive loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer sent a close frame or the stream ended.
    ClosedByPeer,
    /// Reading from the socket failed.
    ReadFailed(String),
    /// [`Outbox::close`] was called and the writer sent its close frame.
    ClosedLocally,
    /// Writing to the socket failed, so the writer stopped.
    WriteFailed(String),
}

/// How the writer task stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WriterExit {
    Closed,
    Failed(String),
}

enum Outbound {
    Frame(String),
    Close,
}

/// Cloneable handle to the session's outbound queue.
#[derive(Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Outbox {
    /// Asks the writer to send a close frame and stop.  A running receive
    /// loop ends as soon as the writer has stopped, even if the peer never
    /// answers the close.
    pub fn close(&self) {
        // The writer may already be gone; nothing left to close then.
        let _ = self.tx.send(Outbound::Close);
    }
}

impl FrameSink for Outbox {
    fn send_frame(&self, frame: String) -> Result<(), SinkClosed> {
        self.tx.send(Outbound::Frame(frame)).map_err(|_| SinkClosed)
    }
}

/// One websocket connection to a chat server.
pub struct TransportSession {
    url: String,
    state: SessionState,
    outbox: Outbox,
    outbound_rx: Option<mpsc::UnboundedReceiver<Outbound>>,
    reader: Option<SplitStream<WsStream>>,
    writer: Option<JoinHandle<WriterExit>>,
}

impl TransportSession {
    /// Creates an idle session for `url`.
    ///
    /// The outbox is usable immediately; frames queued before
    /// [`connect`](Self::connect) are sent once the socket is open.
    pub fn new(url: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            url: url.into(),
            state: SessionState::Idle,
            outbox: Outbox { tx },
            outbound_rx: Some(rx),
            reader: None,
            writer: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns a handle for queueing outbound frames.
    ///
    /// Call [`Outbox::close`] on it to stop a running session.
    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// Dials the server and starts the writer task.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Dial`] if the handshake fails (the session is
    /// then `Closed`), or [`SessionError::AlreadyStarted`] if the session is
    /// not `Idle`.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyStarted(self.state));
        }
        let Some(outbound_rx) = self.outbound_rx.take() else {
            return Err(SessionError::AlreadyStarted(self.state));
        };

        self.state = SessionState::Connecting;
        debug!("dialling {}", self.url);

        let (ws_stream, _response) = match connect_async(self.url.as_str()).await {
            Ok(pair) => pair,
            Err(source) => {
                self.state = SessionState::Closed;
                return Err(SessionError::Dial {
                    url: self.url.clone(),
                    source,
                });
            }
        };

        let (ws_tx, ws_rx) = ws_stream.split();
        self.writer = Some(tokio::spawn(write_outbound(ws_tx, outbound_rx)));
        self.reader = Some(ws_rx);
        self.state = SessionState::Open;
        info!("websocket open: {}", self.url);
        Ok(())
    }

    /// Runs the receive loop until the connection ends.
    ///
    /// Each text frame is routed before the next one is read.  The loop also
    /// ends when the writer task stops.  Afterwards the writer is told to
    /// close (if still running) and is awaited, and the session becomes
    /// `Closed`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotOpen`] unless the session is `Open`.
    pub async fn run(&mut self, router: &FrameRouter) -> Result<SessionEnd, SessionError> {
        if self.state != SessionState::Open {
            return Err(SessionError::NotOpen(self.state));
        }
        let (Some(mut ws_rx), Some(mut writer)) = (self.reader.take(), self.writer.take()) else {
            return Err(SessionError::NotOpen(self.state));
        };

        // A finished JoinHandle must not be polled again.
        let mut writer_done = false;

        let end = loop {
            let next = tokio::select! {
                next = ws_rx.next() => next,
                exit = &mut writer => {
                    writer_done = true;
                    break writer_end(exit);
                }
            };

            let ws_msg = match next {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => break read_error_end(e),
                None => {
                    debug!("websocket stream ended");
                    break SessionEnd::ClosedByPeer;
                }
            };

            match ws_msg {
                WsMessage::Text(text) => {
                    let outcome = router.route(&text);
                    debug!(?outcome, "frame routed");
                }
                WsMessage::Binary(data) => {
                    debug!("ignoring binary frame ({} bytes)", data.len());
                }
                WsMessage::Ping(_) | WsMessage::Pong(_) => {
                    // Pongs are queued by tungstenite itself.
                }
                WsMessage::Close(frame) => {
                    debug!("close frame received: {frame:?}");
                    break SessionEnd::ClosedByPeer;
                }
                WsMessage::Frame(_) => {}
            }
        };

        if !writer_done {
            self.outbox.close();
            if let Err(e) = writer.await {
                warn!("writer task failed: {e}");
            }
        }
        self.state = SessionState::Closed;
        info!("session ended: {end:?}");
        Ok(end)
    }
}

/// Maps a read error to the reason the session ended.
fn read_error_end(e: WsError) -> SessionEnd {
    match e {
        WsError::ConnectionClosed | WsError::AlreadyClosed => {
            debug!("websocket closed by peer");
            SessionEnd::ClosedByPeer
        }
        other => {
            warn!("websocket read failed: {other}");
            SessionEnd::ReadFailed(other.to_string())
        }
    }
}

fn writer_end(exit: Result<WriterExit, JoinError>) -> SessionEnd {
    match exit {
        Ok(WriterExit::Closed) => SessionEnd::ClosedLocally,
        Ok(WriterExit::Failed(reason)) => {
            warn!("websocket write failed: {reason}");
            SessionEnd::WriteFailed(reason)
        }
        Err(e) => {
            warn!("writer task failed: {e}");
            SessionEnd::WriteFailed(e.to_string())
        }
    }
}

/// Drains the outbound queue into the websocket sink, in order.
async fn write_outbound<S>(
    mut ws_tx: S,
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
) -> WriterExit
where
    S: Sink<WsMessage> + Unpin,
    S::Error: Display,
{
    while let Some(item) = outbound_rx.recv().await {
        match item {
            Outbound::Frame(text) => {
                if let Err(e) = ws_tx.send(WsMessage::Text(text)).await {
                    debug!("writer stopping, send failed: {e}");
                    return WriterExit::Failed(e.to_string());
                }
            }
            Outbound::Close => {
                if let Err(e) = ws_tx.send(WsMessage::Close(None)).await {
                    debug!("close frame not sent: {e}");
                }
                debug!("writer task finished after close");
                return WriterExit::Closed;
            }
        }
    }
    debug!("writer task finished, outbox dropped");
    WriterExit::Closed
}

// ── Tests ─────────────────────────────────────────────────────────────────────
