//! Chat server discovery.
//!
//! # How a server is chosen (for beginners)
//!
//! The API publishes a list of chat servers.  Before a websocket can be
//! opened, one of them must hand out a *session id*: a plain-text handshake
//! at `http://<server>/socket.io/1` answers with something like
//! `4fK2x9:60:60:websocket`, and the text before the first `:` is the id.
//!
//! Candidates are probed in list order.  The first one that answers with a
//! usable id wins; servers that refuse the connection, return an error status
//! or an empty id are skipped.  If every candidate fails, the bot cannot
//! start.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// One candidate chat server as published by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Host (and optional port) of the chat server.
    pub server_ip: String,
}

/// The server a session will be opened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSelection {
    /// Position of the server in the list it was selected from.
    pub index: usize,
    pub server: Server,
    /// Handshake id used in the websocket URL.
    pub session_id: String,
}

/// Errors raised while choosing a server.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("failed to fetch server list from {url}: {source}")]
    ServerList {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no reachable chat server ({probed} candidate(s) probed)")]
    NoReachableServer { probed: usize },
}

#[derive(Debug, Error)]
enum ProbeFailure {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("handshake returned no session id")]
    EmptySessionId,
}

/// Extracts the session id from a handshake body: the text before the first
/// `:`, trimmed.  Returns `None` when that text is empty.
pub fn parse_session_id(body: &str) -> Option<&str> {
    let id = body.split(':').next().unwrap_or_default().trim();
    (!id.is_empty()).then_some(id)
}

/// Fetches the server list and probes candidates for a session id.
pub struct ServerSelector {
    http: reqwest::Client,
    api_base: String,
    verbose: bool,
}

impl ServerSelector {
    pub fn new(http: reqwest::Client, api_base: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            verbose: false,
        }
    }

    /// Logs successful probes at `info` instead of `debug`.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Downloads the list of candidate servers.
    ///
    /// An empty list is returned as-is; selection then fails.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::ServerList`] on a transport failure, an error
    /// status, or a body that is not a JSON list of servers.
    pub async fn fetch_servers(&self) -> Result<Vec<Server>, SelectionError> {
        let url = format!("{}/chat/servers.json?redis=true", self.api_base);
        let servers = self
            .request_servers(&url)
            .await
            .map_err(|source| SelectionError::ServerList {
                url: url.clone(),
                source,
            })?;
        debug!("server list has {} candidate(s)", servers.len());
        Ok(servers)
    }

    async fn request_servers(&self, url: &str) -> Result<Vec<Server>, reqwest::Error> {
        self.http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Server>>()
            .await
    }

    /// Probes `servers` in order, starting after index `after` (or at the
    /// beginning when `after` is `None`), and returns the first one that
    /// yields a session id.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::NoReachableServer`] when no remaining
    /// candidate answers.
    pub async fn select_server(
        &self,
        servers: &[Server],
        after: Option<usize>,
    ) -> Result<ServerSelection, SelectionError> {
        let start = after.map_or(0, |i| i.saturating_add(1));
        let mut probed = 0;

        for (index, server) in servers.iter().enumerate().skip(start) {
            probed += 1;
            match self.probe(server).await {
                Ok(session_id) => {
                    if self.verbose {
                        info!("selected chat server {} (#{index})", server.server_ip);
                    } else {
                        debug!("selected chat server {} (#{index})", server.server_ip);
                    }
                    return Ok(ServerSelection {
                        index,
                        server: server.clone(),
                        session_id,
                    });
                }
                Err(e) => warn!("chat server {} unusable: {e}", server.server_ip),
            }
        }

        Err(SelectionError::NoReachableServer { probed })
    }

    async fn probe(&self, server: &Server) -> Result<String, ProbeFailure> {
        let url = format!("http://{}/socket.io/1", server.server_ip);
        let body = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_session_id(&body)
            .map(str::to_string)
            .ok_or(ProbeFailure::EmptySessionId)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
