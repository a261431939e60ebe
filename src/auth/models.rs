//! Authentication models

use axum::{
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    response::Redirect,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Longest accepted username, in characters
pub const MAX_USERNAME_LEN: usize = 64;

/// bcrypt only looks at the first 72 bytes of input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// The user a session is authenticated as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
}

impl SessionUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Register/login payload, from an HTML form or a JSON body
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reject payloads that could never name a valid account
    pub fn validate(&self) -> Result<()> {
        let username = &self.username;

        if username.is_empty() {
            return Err(Error::InvalidCredentials("username is empty".to_string()));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(Error::InvalidCredentials(format!(
                "username longer than {} characters",
                MAX_USERNAME_LEN
            )));
        }
        if username.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(Error::InvalidCredentials(
                "username contains whitespace or control characters".to_string(),
            ));
        }
        if self.password.is_empty() {
            return Err(Error::InvalidCredentials("password is empty".to_string()));
        }
        if self.password.len() > MAX_PASSWORD_BYTES {
            return Err(Error::InvalidCredentials(format!(
                "password longer than {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        Ok(())
    }
}

impl<S> FromRequest<S> for Credentials
where
    S: Send + Sync,
{
    /// Malformed payloads count as a failed attempt
    type Rejection = Redirect;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(credentials) = Json::<Credentials>::from_request(req, state)
                .await
                .map_err(malformed)?;
            Ok(credentials)
        } else {
            let Form(credentials) = Form::<Credentials>::from_request(req, state)
                .await
                .map_err(malformed)?;
            Ok(credentials)
        }
    }
}

fn malformed(rejection: impl fmt::Display) -> Redirect {
    tracing::warn!("Rejected credentials payload: {}", rejection);
    Redirect::to("/")
}
