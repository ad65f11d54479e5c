//! OAuth authentication module
//!
//! Brokers the GitHub and Google authorization-code flows for the frontend:
//! state token bookkeeping, code exchange, profile fetching and
//! normalization of the two providers' profiles into one identity shape.

pub mod github;
pub mod google;
pub mod health;
pub mod identity;
pub mod providers;
pub mod service;
pub mod state;

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub use health::OAuthHealthChecker;
pub use identity::{GitHubProfile, GoogleProfile, NormalizedIdentity, ProviderProfile};
pub use providers::{OAuthProviderClient, initialize_oauth_clients};
pub use service::{CallbackQuery, LoginResponse, OAuthService};
pub use state::{OAUTH_STATE_TTL_SECONDS, StateData, StateTokenStore};

/// Identity providers supported by the login flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    GitHub,
    Google,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::GitHub, Provider::Google];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::GitHub => "github",
            Provider::Google => "google",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::GitHub => "GitHub",
            Provider::Google => "Google",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(Provider::GitHub),
            "google" => Ok(Provider::Google),
            _ => Err(OAuthError::UnknownProvider(s.to_string())),
        }
    }
}

/// Failures of the OAuth flow, each mapping to one callback error code.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("{0} OAuth is not configured")]
    NotConfigured(Provider),
    #[error("Unknown OAuth provider: {0}")]
    UnknownProvider(String),
    #[error("Invalid or expired state token")]
    InvalidState,
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
    #[error("Token response did not contain an access token")]
    MissingAccessToken,
    #[error("Provider rejected the access token (status {0})")]
    ProfileRejected(u16),
    #[error("Failed to fetch user profile: {0}")]
    Profile(String),
    #[error("OAuth internal error: {0}")]
    Internal(String),
}

impl OAuthError {
    /// Error code carried in the frontend redirect.
    pub fn callback_code(&self) -> &'static str {
        match self {
            OAuthError::NotConfigured(_) => "config_error",
            OAuthError::InvalidState => "invalid_state",
            OAuthError::TokenExchange(_) => "token_exchange_failed",
            OAuthError::MissingAccessToken => "no_access_token",
            OAuthError::ProfileRejected(_) | OAuthError::Profile(_) => "user_data_failed",
            OAuthError::UnknownProvider(_) | OAuthError::Internal(_) => "server_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("github".parse::<Provider>().unwrap(), Provider::GitHub);
        assert_eq!("Google".parse::<Provider>().unwrap(), Provider::Google);
        assert!(matches!(
            "gitlab".parse::<Provider>(),
            Err(OAuthError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Provider::GitHub.display_name(), "GitHub");
        assert_eq!(Provider::Google.display_name(), "Google");
        assert_eq!(Provider::GitHub.to_string(), "github");
    }

    #[test]
    fn test_callback_codes() {
        assert_eq!(
            OAuthError::NotConfigured(Provider::Google).callback_code(),
            "config_error"
        );
        assert_eq!(OAuthError::InvalidState.callback_code(), "invalid_state");
        assert_eq!(
            OAuthError::TokenExchange("400".to_string()).callback_code(),
            "token_exchange_failed"
        );
        assert_eq!(OAuthError::MissingAccessToken.callback_code(), "no_access_token");
        assert_eq!(OAuthError::ProfileRejected(401).callback_code(), "user_data_failed");
        assert_eq!(
            OAuthError::Internal("boom".to_string()).callback_code(),
            "server_error"
        );
    }

    #[test]
    fn test_provider_serde() {
        assert_eq!(serde_json::to_string(&Provider::GitHub).unwrap(), "\"github\"");
        let provider: Provider = serde_json::from_str("\"google\"").unwrap();
        assert_eq!(provider, Provider::Google);
    }
}
