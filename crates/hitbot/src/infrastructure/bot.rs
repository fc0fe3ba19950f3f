//! Startup sequence: discovery, authentication, session.
//!
//! [`Bot::run`] performs the steps below in order and returns once the
//! session ends.  Any failure before the websocket is open is fatal and is
//! returned as a [`BotError`]; nothing is retried.
//!
//! 1. Fetch the server list.
//! 2. Probe servers for a session id.
//! 3. Exchange the credential for a token.
//! 4. Wire the composer, dispatcher and router to the session's outbox.
//! 5. Open the websocket and run the receive loop.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use hitbot_core::{BotIdentity, CommandDispatcher, CommandRegistry};

use crate::application::composer::MessageComposer;
use crate::application::router::FrameRouter;
use crate::infrastructure::auth::{AuthContext, AuthenticationFailure};
use crate::infrastructure::discovery::{SelectionError, ServerSelector};
use crate::infrastructure::transport::{websocket_url, SessionEnd, SessionError, TransportSession};

/// Fatal startup and session errors.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Authentication(#[from] AuthenticationFailure),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Everything needed to bring one bot session up.
pub struct Bot {
    identity: BotIdentity,
    api_base: String,
    channels: Vec<String>,
    registry: Arc<CommandRegistry>,
    http: reqwest::Client,
}

impl Bot {
    pub fn new(
        identity: BotIdentity,
        api_base: impl Into<String>,
        channels: Vec<String>,
        registry: CommandRegistry,
    ) -> Self {
        Self {
            identity,
            api_base: api_base.into(),
            channels,
            registry: Arc::new(registry),
            http: reqwest::Client::new(),
        }
    }

    /// Connects and serves one session until it ends.
    ///
    /// # Errors
    ///
    /// Returns [`BotError`] if no server is reachable, authentication fails,
    /// or the websocket cannot be opened.
    pub async fn run(&self, credential: &str) -> Result<SessionEnd, BotError> {
        let verbose = self.identity.is_verbose();

        let selector = ServerSelector::new(self.http.clone(), &self.api_base).with_verbose(verbose);
        let servers = selector.fetch_servers().await?;
        let selection = selector.select_server(&servers, None).await?;

        let token = AuthContext::new(self.http.clone(), &self.api_base)
            .authenticate(self.identity.name(), credential)
            .await?;

        let mut session = TransportSession::new(websocket_url(
            &selection.server.server_ip,
            &selection.session_id,
        ));
        let composer = Arc::new(MessageComposer::new(
            self.identity.clone(),
            token,
            Arc::new(session.outbox()),
        ));
        let dispatcher = CommandDispatcher::new(Arc::clone(&self.registry)).with_verbose(verbose);
        let router = FrameRouter::new(composer, dispatcher, self.channels.iter().cloned());

        session.connect().await?;
        info!(
            "connected to {} as {}, {} command(s) registered",
            selection.server.server_ip,
            self.identity.name(),
            self.registry.len()
        );

        Ok(session.run(&router).await?)
    }
}
