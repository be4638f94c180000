//! Registry credential resolution
//!
//! The credential is resolved once at startup from the run configuration and
//! held as a `SecretString` so it never shows up in `Debug` output.

use crate::core::error::PublishError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};

/// Credential presented to the registry
#[derive(Debug)]
pub enum Credential {
    /// Access token, written as `_authToken`
    Token(SecretString),
    /// Base64-encoded `user:password` blob, written as `_auth`
    Auth(SecretString),
}

impl Credential {
    /// Resolve a credential from a token and a raw credential blob.
    ///
    /// Values are trimmed and blank values count as absent. A token takes
    /// precedence over a blob. The blob is base64-encoded here and nowhere
    /// else.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::MissingCredential` if neither is present.
    ///
    /// # Examples
    ///
    /// ```
    /// use npm_workspace_publisher::security::Credential;
    ///
    /// let credential = Credential::resolve(None, Some("user:pass")).unwrap();
    /// assert_eq!(credential.auth_key(), "_auth");
    /// assert_eq!(credential.expose(), "dXNlcjpwYXNz");
    /// ```
    pub fn resolve(token: Option<&str>, blob: Option<&str>) -> Result<Self, PublishError> {
        let token = token.map(str::trim).filter(|t| !t.is_empty());
        let blob = blob.map(str::trim).filter(|b| !b.is_empty());

        match (token, blob) {
            (Some(token), _) => Ok(Self::Token(SecretString::new(token.into()))),
            (None, Some(blob)) => Ok(Self::Auth(SecretString::new(
                STANDARD.encode(blob).into(),
            ))),
            (None, None) => Err(PublishError::MissingCredential),
        }
    }

    /// `.npmrc` key carrying this credential
    pub fn auth_key(&self) -> &'static str {
        match self {
            Self::Token(_) => "_authToken",
            Self::Auth(_) => "_auth",
        }
    }

    /// Placeholder used in place of the secret when logging
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Token(_) => "TOKEN",
            Self::Auth(_) => "CREDENTIALS",
        }
    }

    /// Value written into `.npmrc`
    pub fn expose(&self) -> &str {
        match self {
            Self::Token(secret) | Self::Auth(secret) => secret.expose_secret(),
        }
    }
}
