use super::token::{expiry_after, generate_token, hash_token};
use crate::metrics::track_admin_login;
use axum::http::{HeaderMap, HeaderName};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{info, warn};

/// Header carrying the admin session token on mutating requests
pub static X_ADMIN_TOKEN: HeaderName = HeaderName::from_static("x-admin-token");

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Admin access is not configured")]
    NotConfigured,
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Invalid or missing admin token")]
    InvalidToken,
}

/// Sessions issued by a successful admin password check.
///
/// Tokens are kept as SHA-256 hashes mapped to their issue time. Without a
/// TTL a session lives until the process exits.
#[derive(Clone)]
pub struct AdminSessionStore {
    password: Option<Arc<str>>,
    sessions: Arc<DashMap<String, DateTime<Utc>>>,
    ttl: Option<Duration>,
}

impl AdminSessionStore {
    pub fn new(password: Option<String>, ttl_seconds: Option<u64>) -> Self {
        Self {
            password: password.filter(|p| !p.is_empty()).map(Arc::from),
            sessions: Arc::new(DashMap::new()),
            ttl: ttl_seconds
                .and_then(|secs| i64::try_from(secs).ok())
                .and_then(Duration::try_seconds),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.password.is_some()
    }

    /// Check `password` and open a new session.
    pub fn login(&self, password: &str) -> Result<String, AdminError> {
        let expected = self.password.as_deref().ok_or_else(|| {
            warn!("Admin login attempted but no admin password is configured");
            track_admin_login("disabled");
            AdminError::NotConfigured
        })?;

        // Compare digests so the comparison time does not depend on length.
        let presented = Sha256::digest(password.as_bytes());
        let expected = Sha256::digest(expected.as_bytes());
        if !bool::from(presented.as_slice().ct_eq(expected.as_slice())) {
            warn!("Admin login rejected");
            track_admin_login("failure");
            return Err(AdminError::InvalidPassword);
        }

        let token = generate_token();
        self.sessions.insert(hash_token(&token), Utc::now());
        info!(active_sessions = self.sessions.len(), "Admin session opened");
        track_admin_login("success");
        Ok(token)
    }

    pub fn is_valid(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        let Some(issued_at) = self.sessions.get(&hash_token(token)).map(|entry| *entry) else {
            return false;
        };
        !self.is_expired(issued_at, Utc::now())
    }

    /// Validate the `X-ADMIN-TOKEN` header of a request.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AdminError> {
        let token = headers
            .get(&X_ADMIN_TOKEN)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .ok_or(AdminError::InvalidToken)?;

        if self.is_valid(token) {
            Ok(())
        } else {
            Err(AdminError::InvalidToken)
        }
    }

    fn is_expired(&self, issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.ttl.is_some_and(|ttl| expiry_after(issued_at, ttl) <= now)
    }

    /// Drop expired sessions, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let before = self.sessions.len();
        let now = Utc::now();
        self.sessions
            .retain(|_, issued_at| !self.is_expired(*issued_at, now));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(&X_ADMIN_TOKEN, HeaderValue::from_str(token).unwrap());
        headers
    }

    #[test]
    fn test_login_disabled_without_password() {
        let store = AdminSessionStore::new(None, None);
        assert!(!store.is_enabled());
        assert!(matches!(store.login("anything"), Err(AdminError::NotConfigured)));

        let store = AdminSessionStore::new(Some(String::new()), None);
        assert!(matches!(store.login(""), Err(AdminError::NotConfigured)));
    }

    #[test]
    fn test_login_wrong_password() {
        let store = AdminSessionStore::new(Some("hunter2".to_string()), None);
        assert!(matches!(store.login("hunter3"), Err(AdminError::InvalidPassword)));
        assert!(matches!(store.login("hunter2 "), Err(AdminError::InvalidPassword)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_issued_tokens_are_valid_and_distinct() {
        let store = AdminSessionStore::new(Some("hunter2".to_string()), None);
        let first = store.login("hunter2").unwrap();
        let second = store.login("hunter2").unwrap();

        assert_ne!(first, second);
        assert!(store.is_valid(&first));
        assert!(store.is_valid(&second));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let store = AdminSessionStore::new(Some("hunter2".to_string()), None);
        store.login("hunter2").unwrap();

        assert!(!store.is_valid("made-up"));
        assert!(!store.is_valid(""));
        assert!(!store.is_valid(&generate_token()));
    }

    #[test]
    fn test_tokens_are_stored_hashed() {
        let store = AdminSessionStore::new(Some("hunter2".to_string()), None);
        let token = store.login("hunter2").unwrap();

        assert!(!store.sessions.contains_key(&token));
        assert!(store.sessions.contains_key(&hash_token(&token)));
    }

    #[test]
    fn test_authorize_header() {
        let store = AdminSessionStore::new(Some("hunter2".to_string()), None);
        let token = store.login("hunter2").unwrap();

        assert!(store.authorize(&headers_with(&token)).is_ok());
        assert!(matches!(
            store.authorize(&headers_with("nope")),
            Err(AdminError::InvalidToken)
        ));
        assert!(matches!(
            store.authorize(&HeaderMap::new()),
            Err(AdminError::InvalidToken)
        ));
    }

    #[test]
    fn test_sessions_without_ttl_never_expire() {
        let store = AdminSessionStore::new(Some("pw".to_string()), None);
        let token = store.login("pw").unwrap();

        assert_eq!(store.purge_expired(), 0);
        assert!(store.is_valid(&token));
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let store = AdminSessionStore::new(Some("pw".to_string()), Some(i64::MAX as u64 / 1000));
        let token = store.login("pw").unwrap();

        assert!(store.is_valid(&token));
        assert_eq!(store.purge_expired(), 0);
    }

    #[test]
    fn test_sessions_with_zero_ttl_expire() {
        let store = AdminSessionStore::new(Some("pw".to_string()), Some(0));
        let token = store.login("pw").unwrap();

        assert!(!store.is_valid(&token));
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalid_token_message() {
        assert_eq!(
            AdminError::InvalidToken.to_string(),
            "Invalid or missing admin token"
        );
    }
}
