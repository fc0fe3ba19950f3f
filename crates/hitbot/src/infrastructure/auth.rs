//! Token exchange with the chat API.
//!
//! The bot posts its login name and password as a form to `/auth/token` and
//! receives `{"authToken": "..."}`.  The token is attached to every
//! `joinChannel` request.  The response body is read in full before it is
//! parsed, so tokens of any length are accepted.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use hitbot_core::AuthToken;

/// Why a token could not be obtained.
#[derive(Debug, Error)]
pub enum AuthenticationFailure {
    #[error("token request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("credentials rejected (HTTP {status})")]
    Rejected { status: u16 },

    #[error("token response is not valid JSON with an authToken: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("token response contained an empty authToken")]
    EmptyToken,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(rename = "authToken")]
    auth_token: String,
}

/// Obtains auth tokens from `{api_base}/auth/token`.
pub struct AuthContext {
    http: reqwest::Client,
    api_base: String,
}

impl AuthContext {
    pub fn new(http: reqwest::Client, api_base: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Exchanges `login` and `credential` for a token.
    ///
    /// # Errors
    ///
    /// - [`AuthenticationFailure::Transport`] if the request cannot be sent
    ///   or the body cannot be read.
    /// - [`AuthenticationFailure::Rejected`] for any status other than 200.
    /// - [`AuthenticationFailure::MalformedBody`] / [`AuthenticationFailure::EmptyToken`]
    ///   if the body carries no usable token.
    pub async fn authenticate(
        &self,
        login: &str,
        credential: &str,
    ) -> Result<AuthToken, AuthenticationFailure> {
        let url = format!("{}/auth/token", self.api_base);
        debug!("requesting auth token for {login}");

        let response = self
            .http
            .post(&url)
            .form(&[("login", login), ("pass", credential)])
            .send()
            .await
            .map_err(AuthenticationFailure::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AuthenticationFailure::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(AuthenticationFailure::Transport)?;
        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(AuthenticationFailure::MalformedBody)?;
        if parsed.auth_token.is_empty() {
            return Err(AuthenticationFailure::EmptyToken);
        }

        info!("authenticated as {login}");
        Ok(AuthToken::new(parsed.auth_token))
    }
}
