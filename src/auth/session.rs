//! Server-side admin sessions.
//!
//! The client holds a 256-bit random token in the session cookie; the store
//! keys sessions by the SHA-256 hash of that token, so a dump of the map
//! cannot be replayed as cookies.

use std::fmt;
use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::SessionConfig;

/// Plaintext session token as handed to the client.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: chrono::Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    pub fn create(&self, username: &str) -> (SessionToken, Session) {
        let token = SessionToken::generate();
        let now = Utc::now();
        let session = Session {
            username: username.to_string(),
            created_at: now,
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        self.sessions.insert(hash_token(token.as_str()), session.clone());
        tracing::debug!(username = %username, expires_at = %session.expires_at, "Session created");

        (token, session)
    }

    /// Look up a live session. Expired sessions are removed on sight.
    pub fn get(&self, token: &str) -> Option<Session> {
        let key = hash_token(token);
        let session = self.sessions.get(&key).map(|s| s.value().clone())?;

        if session.is_expired(Utc::now()) {
            self.sessions.remove(&key);
            return None;
        }

        Some(session)
    }

    /// Session referenced by the named cookie, if any.
    pub fn from_jar(&self, jar: &CookieJar, cookie_name: &str) -> Option<Session> {
        jar.get(cookie_name).and_then(|cookie| self.get(cookie.value()))
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(&hash_token(token)).is_some()
    }

    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// `admin_session` cookie carrying `token`.
pub fn session_cookie(config: &SessionConfig, token: &SessionToken) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token.as_str().to_string()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookie)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(
            i64::try_from(config.ttl_secs).unwrap_or(i64::MAX),
        ))
        .build()
}

/// Cookie that matches the session cookie for removal.
pub fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), "")).path("/").build()
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (token, session) = store.create("admin");

        assert_eq!(token.as_str().len(), 64);
        let found = store.get(token.as_str()).unwrap();
        assert_eq!(found.username, "admin");
        assert_eq!(found.expires_at, session.expires_at);
        assert!(store.get("not-a-token").is_none());
    }

    #[test]
    fn test_tokens_are_unique() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (a, _) = store.create("admin");
        let (b, _) = store.create("admin");
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_revoke() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (token, _) = store.create("admin");

        assert!(store.revoke(token.as_str()));
        assert!(store.get(token.as_str()).is_none());
        assert!(!store.revoke(token.as_str()));
    }

    #[test]
    fn test_expired_sessions_are_dropped() {
        let store = SessionStore::new(Duration::ZERO);
        let (token, _) = store.create("admin");

        assert!(store.get(token.as_str()).is_none());
        assert!(store.is_empty());

        store.create("admin");
        assert_eq!(store.purge_expired(), 1);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let config = SessionConfig::default();
        let store = SessionStore::new(config.ttl());
        let (token, _) = store.create("admin");

        let cookie = session_cookie(&config, &token);
        assert_eq!(cookie.name(), "admin_session");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(24)));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (token, _) = store.create("admin");
        assert!(!format!("{token:?}").contains(token.as_str()));
    }
}
