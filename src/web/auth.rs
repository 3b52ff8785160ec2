//! Session cookie handling and the `CurrentUser` extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Uri};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::WebError;
use super::{AppState, NOTES_URL};
use crate::entity::User;

pub const SESSION_COOKIE: &str = "notekeeper_session";
pub const LOGIN_URL: &str = "/accounts/login/";

/// Two weeks.
pub const DEFAULT_SESSION_LIFETIME_SECS: u64 = 14 * 24 * 60 * 60;

/// Login session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds a session stays valid after login.
    pub lifetime_secs: u64,
    /// Add `Secure` to the session cookie. Enable when served over HTTPS.
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime_secs: DEFAULT_SESSION_LIFETIME_SECS,
            secure_cookie: false,
        }
    }
}

impl SessionConfig {
    /// Oldest session creation time still accepted at `now`.
    pub fn not_before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        i64::try_from(self.lifetime_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_sub_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// `Set-Cookie` value for a fresh session.
    pub fn cookie(&self, token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
            self.lifetime_secs,
            self.secure_attr()
        )
    }

    /// `Set-Cookie` value that clears the session cookie.
    pub fn expired_cookie(&self) -> String {
        format!(
            "{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{}",
            self.secure_attr()
        )
    }

    fn secure_attr(&self) -> &'static str {
        if self.secure_cookie {
            "; Secure"
        } else {
            ""
        }
    }
}

/// The authenticated requester. Any handler that takes this argument
/// requires a login; anonymous requests are redirected before it runs.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session_token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let Some(token) = session_token(&parts.headers) else {
            return Err(WebError::LoginRequired { next });
        };

        let not_before = state.sessions.not_before(Utc::now());
        let user = state
            .store
            .lock()
            .await
            .user_for_session(&token, not_before)?;
        match user {
            Some(user) => Ok(Self {
                user,
                session_token: token,
            }),
            None => {
                debug!("expired or unknown session cookie");
                Err(WebError::LoginRequired { next })
            }
        }
    }
}

/// Pull the session token out of the `Cookie` header(s).
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Login page URL that returns to `next` afterwards.
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_URL}?next={}", encode_next(next))
}

/// Percent-encode everything except unreserved characters and `/`.
fn encode_next(next: &str) -> String {
    let mut out = String::with_capacity(next.len());
    for byte in next.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Only same-site absolute paths are honored as a post-login target.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if is_local_path(path) => path,
        _ => NOTES_URL,
    }
}

/// Browsers drop tabs and newlines and read `\` as `/`, so any of those
/// could turn a path into `//host`.
fn is_local_path(path: &str) -> bool {
    if !path.starts_with('/') || path.starts_with("//") {
        return false;
    }
    if path
        .chars()
        .any(|c| c.is_control() || c.is_whitespace() || c == '\\')
    {
        return false;
    }
    match path.parse::<Uri>() {
        Ok(uri) => uri.scheme().is_none() && uri.authority().is_none(),
        Err(_) => false,
    }
}
