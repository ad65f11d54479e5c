use super::Provider;
use crate::auth::token::expiry_after;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use oauth2::CsrfToken;
use std::sync::Arc;
use tracing::debug;

/// Default OAuth state token TTL (10 minutes)
pub const OAUTH_STATE_TTL_SECONDS: i64 = 600;

/// Random bytes per state token; 32 bytes encode to 43 URL-safe characters.
const STATE_TOKEN_BYTES: u32 = 32;

/// A pending login flow, keyed by its state token.
#[derive(Clone, Debug)]
pub struct StateData {
    pub provider: Provider,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StateData {
    fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Single-use CSRF state tokens proving that a login flow was started here.
#[derive(Clone)]
pub struct StateTokenStore {
    pending: Arc<DashMap<String, StateData>>,
    ttl: Duration,
}

impl StateTokenStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            ttl: Duration::try_seconds(ttl_seconds)
                .unwrap_or_else(|| Duration::seconds(OAUTH_STATE_TTL_SECONDS)),
        }
    }

    /// Create and remember a fresh state token for `provider`.
    pub fn issue(&self, provider: Provider) -> String {
        let state = CsrfToken::new_random_len(STATE_TOKEN_BYTES).secret().clone();
        let now = Utc::now();
        self.pending.insert(
            state.clone(),
            StateData {
                provider,
                created_at: now,
                expires_at: expiry_after(now, self.ttl),
            },
        );
        state
    }

    /// Remove `state` and report whether it was a live token issued for
    /// `provider`. The token is consumed even when the provider does not
    /// match, so a second attempt always fails.
    pub fn consume_if_valid(&self, state: &str, provider: Provider) -> bool {
        match self.pending.remove(state) {
            Some((_, data)) if data.is_expired() => {
                debug!(provider = %provider, "Rejected expired OAuth state");
                false
            }
            Some((_, data)) if data.provider != provider => {
                debug!(
                    issued_for = %data.provider,
                    presented_to = %provider,
                    "Rejected OAuth state issued for another provider"
                );
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn contains(&self, state: &str) -> bool {
        self.pending.contains_key(state)
    }

    /// Drop every expired token, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.pending.len();
        let now = Utc::now();
        self.pending.retain(|_, data| data.expires_at > now);
        before.saturating_sub(self.pending.len())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for StateTokenStore {
    fn default() -> Self {
        Self::new(OAUTH_STATE_TTL_SECONDS)
    }
}
