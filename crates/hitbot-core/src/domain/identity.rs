//! The bot's identity on the chat service and the token that proves it.

use std::fmt;

use thiserror::Error;

/// Name colour used when none is configured.
pub const DEFAULT_NAME_COLOR: &str = "ffffff";

/// Errors raised when constructing or updating a [`BotIdentity`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("bot name must not be empty")]
    EmptyName,

    #[error("invalid name colour '{0}': expected six hex digits")]
    InvalidColor(String),
}

/// Name, display colour and verbosity of the bot.
///
/// Only the colour can change after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    name: String,
    color: String,
    verbose: bool,
}

impl BotIdentity {
    /// Creates an identity with the default name colour.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::EmptyName`] if `name` is blank.
    pub fn new(name: impl Into<String>, verbose: bool) -> Result<Self, IdentityError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(IdentityError::EmptyName);
        }
        Ok(Self {
            name,
            color: DEFAULT_NAME_COLOR.to_string(),
            verbose,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name colour as six lowercase hex digits, without `#`.
    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Sets the name colour.  A leading `#` is accepted and stripped.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidColor`] unless the colour is exactly
    /// six hex digits; the previous colour is kept in that case.
    pub fn set_color(&mut self, color: &str) -> Result<(), IdentityError> {
        let hex = color.strip_prefix('#').unwrap_or(color);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdentityError::InvalidColor(color.to_string()));
        }
        self.color = hex.to_ascii_lowercase();
        Ok(())
    }
}

/// Bearer token issued by the token endpoint; required to join channels.
///
/// `Debug` output is redacted so the token never lands in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(<{} bytes>)", self.0.len())
    }
}
