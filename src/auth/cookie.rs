//! Session cookie encoding

use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::{CookieSecurity, SessionConfig};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub security: CookieSecurity,
}

impl CookieSettings {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            security: config.secure,
        }
    }

    /// Value of this cookie in the request, if present
    pub fn read<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        let prefix = format!("{}=", self.name);
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .find_map(|cookie| cookie.trim().strip_prefix(prefix.as_str()))
            .filter(|token| !token.is_empty())
    }

    /// `Set-Cookie` value carrying a session token
    pub fn issue(&self, token: &str, max_age_secs: i64, request: &HeaderMap) -> Result<HeaderValue> {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name,
            token,
            max_age_secs.max(0)
        );
        if self.secure_for(request) {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
            .map_err(|e| Error::Session(format!("Unencodable session cookie: {}", e)))
    }

    /// `Set-Cookie` value that makes the client drop the cookie
    pub fn clear(&self, request: &HeaderMap) -> Result<HeaderValue> {
        self.issue("", 0, request)
    }

    fn secure_for(&self, request: &HeaderMap) -> bool {
        match self.security {
            CookieSecurity::Always => true,
            CookieSecurity::Never => false,
            CookieSecurity::Auto => is_https(request),
        }
    }
}

/// Whether a proxy in front of us reports the request as HTTPS
pub fn is_https(headers: &HeaderMap) -> bool {
    headers
        .get("X-Forwarded-Proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}
