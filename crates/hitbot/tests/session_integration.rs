//! End-to-end session tests against a local tokio-tungstenite chat server.
//!
//! The fake server accepts one websocket, forwards every text frame the bot
//! sends to the test, and pushes frames scripted by the test to the bot.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, accept_hdr_async};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hitbot::application::{FrameRouter, HandlerKinds, MessageComposer};
use hitbot::domain::CommandEntry;
use hitbot::infrastructure::{
    websocket_url, Bot, BotError, SelectionError, SessionEnd, SessionState, TransportSession,
};
use hitbot_core::{AuthToken, BotIdentity, CommandDispatcher, CommandRegistry};

// ── Fake chat server ──────────────────────────────────────────────────────────

enum ServerCmd {
    Send(String),
    Close,
}

struct FakeChatServer {
    addr: SocketAddr,
    to_client: mpsc::UnboundedSender<ServerCmd>,
    from_client: mpsc::UnboundedReceiver<String>,
    ws_path: Arc<Mutex<Option<String>>>,
}

impl FakeChatServer {
    /// Starts the server.  With `handshake_id`, the first TCP connection is
    /// answered as the plain-HTTP session-id handshake.
    async fn start(handshake_id: Option<&'static str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (to_client, mut cmd_rx) = mpsc::unbounded_channel();
        let (frame_tx, from_client) = mpsc::unbounded_channel();
        let ws_path = Arc::new(Mutex::new(None));
        let path_slot = Arc::clone(&ws_path);

        tokio::spawn(async move {
            if let Some(id) = handshake_id {
                answer_handshake(&listener, id).await;
            }

            let (stream, _) = listener.accept().await.unwrap();
            let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                *path_slot.lock().unwrap() = Some(req.uri().path().to_string());
                Ok(resp)
            };
            let ws = accept_hdr_async(stream, callback).await.unwrap();
            let (mut tx, mut rx) = ws.split();

            loop {
                tokio::select! {
                    cmd = cmd_rx.recv() => match cmd {
                        Some(ServerCmd::Send(text)) => {
                            if tx.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Some(ServerCmd::Close) | None => {
                            let _ = tx.send(Message::Close(None)).await;
                            while let Some(Ok(msg)) = rx.next().await {
                                if let Message::Text(text) = msg {
                                    let _ = frame_tx.send(text);
                                }
                            }
                            break;
                        }
                    },
                    msg = rx.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            let _ = frame_tx.send(text);
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    },
                }
            }
        });

        Self {
            addr,
            to_client,
            from_client,
            ws_path,
        }
    }

    fn send(&self, frame: &str) {
        self.to_client
            .send(ServerCmd::Send(frame.to_string()))
            .unwrap();
    }

    fn close(&self) {
        self.to_client.send(ServerCmd::Close).unwrap();
    }

    async fn recv(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(5), self.from_client.recv())
            .await
            .expect("timed out waiting for a frame from the bot")
            .expect("server task ended")
    }

    fn ws_path(&self) -> Option<String> {
        self.ws_path.lock().unwrap().clone()
    }
}

/// Answers one plain HTTP request with a socket.io handshake body.
async fn answer_handshake(listener: &TcpListener, id: &str) {
    let (mut stream, _) = listener.accept().await.unwrap();
    let mut request = Vec::new();
    let mut chunk = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        request.extend_from_slice(&chunk[..n]);
    }
    let body = format!("{id}:60:60:websocket");
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await.unwrap();
    let _ = stream.shutdown().await;
}

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn chat_frame(channel: &str, name: &str, text: &str) -> String {
    let inner = serde_json::json!({
        "method": "chatMsg",
        "params": { "channel": channel, "name": name, "text": text, "role": "user" }
    });
    format!(
        "5:::{}",
        serde_json::json!({ "name": "message", "args": [inner.to_string()] })
    )
}

fn registry() -> CommandRegistry {
    let entries = vec![CommandEntry {
        name: "hello".to_string(),
        handler: "reply".to_string(),
        role: "anon".to_string(),
        channel: None,
        data: serde_json::json!({ "text": "hi {name}" }),
    }];
    HandlerKinds::builtin().build_registry(&entries).unwrap()
}

fn event_params(frame: &str) -> serde_json::Value {
    let envelope: serde_json::Value =
        serde_json::from_str(frame.strip_prefix("5:::").expect("event frame")).unwrap();
    envelope["args"][0].clone()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_routes_scripted_frames() {
    // Arrange
    let mut server = FakeChatServer::start(None).await;
    let mut session = TransportSession::new(websocket_url(&server.addr.to_string(), "sid"));
    let composer = Arc::new(MessageComposer::new(
        BotIdentity::new("mybot", false).unwrap(),
        AuthToken::new("tok123"),
        Arc::new(session.outbox()),
    ));
    let router = FrameRouter::new(
        composer,
        CommandDispatcher::new(Arc::new(registry())),
        vec!["General".to_string()],
    );
    session.connect().await.unwrap();
    assert_eq!(session.state(), SessionState::Open);

    let script = async {
        // Connect ack → one join per channel
        server.send("1::");
        let join = event_params(&server.recv().await);
        assert_eq!(join["method"], "joinChannel");
        assert_eq!(join["params"]["channel"], "general");
        assert_eq!(join["params"]["token"], "tok123");
        assert_eq!(join["params"]["isAdmin"], false);

        // Heartbeat → identical frame back
        server.send("2::");
        assert_eq!(server.recv().await, "2::");

        // Malformed frame is skipped; the next heartbeat is still answered
        server.send("5:::{broken");
        server.send("2::");
        assert_eq!(server.recv().await, "2::");

        // Command → reply in the same channel
        server.send(&chat_frame("general", "alice", "!hello"));
        let reply = event_params(&server.recv().await);
        assert_eq!(reply["method"], "chatMsg");
        assert_eq!(reply["params"]["text"], "hi alice");
        assert_eq!(reply["params"]["channel"], "general");

        // An unknown command produces nothing; the heartbeat after it is the
        // next frame the server sees.
        server.send(&chat_frame("general", "alice", "!nope"));
        server.send("2::");
        assert_eq!(server.recv().await, "2::");

        server.close();
    };

    // Act
    let (end, ()) = tokio::join!(session.run(&router), script);

    // Assert
    assert_eq!(end.unwrap(), SessionEnd::ClosedByPeer);
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_local_close_ends_session_when_peer_never_reads() {
    // Arrange: a peer that completes the handshake, then neither reads nor
    // writes while keeping the socket open.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let _ws = accept_async(stream).await.unwrap();
        let _ = release_rx.await;
    });

    let mut session = TransportSession::new(websocket_url(&addr.to_string(), "sid"));
    let outbox = session.outbox();
    let composer = Arc::new(MessageComposer::new(
        BotIdentity::new("mybot", false).unwrap(),
        AuthToken::new("tok123"),
        Arc::new(session.outbox()),
    ));
    let router = FrameRouter::new(
        composer,
        CommandDispatcher::new(Arc::new(CommandRegistry::default())),
        Vec::new(),
    );
    session.connect().await.unwrap();

    // Act
    let (end, ()) = tokio::join!(
        tokio::time::timeout(Duration::from_secs(3), session.run(&router)),
        async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            outbox.close();
        }
    );

    // Assert
    let end = end.expect("session kept running after a local close");
    assert_eq!(end.unwrap(), SessionEnd::ClosedLocally);
    assert_eq!(session.state(), SessionState::Closed);
    drop(release_tx);
}

#[tokio::test]
async fn test_bot_runs_full_startup_sequence() {
    // Arrange: chat server answering the handshake, API with list and token
    let mut chat = FakeChatServer::start(Some("sid42")).await;
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chat/servers.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "server_ip": "127.0.0.1:1" },
            { "server_ip": chat.addr.to_string() }
        ])))
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "authToken": "tok123" })),
        )
        .mount(&api)
        .await;

    let bot = Bot::new(
        BotIdentity::new("mybot", true).unwrap(),
        api.uri(),
        vec!["general".to_string()],
        registry(),
    );

    let script = async {
        chat.send("1::");
        let join = event_params(&chat.recv().await);
        assert_eq!(join["params"]["name"], "mybot");
        assert_eq!(join["params"]["token"], "tok123");

        chat.send(&chat_frame("general", "bob", "!hello"));
        let reply = event_params(&chat.recv().await);
        assert_eq!(reply["params"]["text"], "hi bob");

        chat.close();
    };

    // Act
    let (end, ()) = tokio::join!(bot.run("secret"), script);

    // Assert
    assert_eq!(end.unwrap(), SessionEnd::ClosedByPeer);
    assert_eq!(chat.ws_path().as_deref(), Some("/socket.io/1/websocket/sid42"));
}

#[tokio::test]
async fn test_bot_without_reachable_server_fails_before_auth() {
    // Arrange
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chat/servers.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "server_ip": "127.0.0.1:1" }])),
        )
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&api)
        .await;
    let bot = Bot::new(
        BotIdentity::new("mybot", false).unwrap(),
        api.uri(),
        Vec::new(),
        CommandRegistry::default(),
    );

    // Act
    let result = bot.run("secret").await;

    // Assert
    assert!(matches!(
        result,
        Err(BotError::Selection(SelectionError::NoReachableServer { probed: 1 }))
    ));
}
