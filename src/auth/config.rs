use super::oauth::Provider;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub github: OAuthProvider,
    #[serde(default)]
    pub google: OAuthProvider,
    /// Upper bound for every outbound call to a provider
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,
}

fn default_http_timeout_seconds() -> u64 {
    10
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            github: OAuthProvider::default(),
            google: OAuthProvider::default(),
            http_timeout_seconds: default_http_timeout_seconds(),
        }
    }
}

impl OAuthConfig {
    pub fn provider(&self, provider: Provider) -> &OAuthProvider {
        match provider {
            Provider::GitHub => &self.github,
            Provider::Google => &self.google,
        }
    }

    /// Fill in endpoint URLs, scopes and redirect URIs that were not set
    /// explicitly.
    pub fn apply_provider_defaults(&mut self) {
        apply_predefined_provider_defaults(Provider::GitHub, &mut self.github);
        apply_predefined_provider_defaults(Provider::Google, &mut self.google);
    }
}

/// Credentials and endpoints of a single OAuth provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OAuthProvider {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub authorization_url: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub user_info_url: Option<String>,
}

impl OAuthProvider {
    pub fn client_id(&self) -> Option<&str> {
        non_empty(self.client_id.as_deref())
    }

    pub fn client_secret(&self) -> Option<&str> {
        non_empty(self.client_secret.as_deref())
    }

    /// Both halves of the client credentials are present.
    pub fn is_configured(&self) -> bool {
        self.client_id().is_some() && self.client_secret().is_some()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of a pending OAuth state token
    #[serde(default = "default_state_ttl_seconds")]
    pub state_ttl_seconds: u64,
    /// Lifetime of an admin session; unset means until process restart
    #[serde(default)]
    pub admin_session_ttl_seconds: Option<u64>,
    /// How often expired state tokens and sessions are swept
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

fn default_state_ttl_seconds() -> u64 {
    600 // 10 minutes
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            state_ttl_seconds: default_state_ttl_seconds(),
            admin_session_ttl_seconds: None,
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    /// Shared admin password; admin login is disabled when unset
    #[serde(default)]
    pub password: Option<String>,
}

/// Apply predefined OAuth provider defaults
pub fn apply_predefined_provider_defaults(provider: Provider, config: &mut OAuthProvider) {
    match provider {
        Provider::GitHub => apply_github_defaults(config),
        Provider::Google => apply_google_defaults(config),
    }
    if config.redirect_uri.is_none() {
        config.redirect_uri = Some(format!(
            "http://localhost:8000/api/auth/{}/callback",
            provider.as_str()
        ));
    }
}

fn apply_google_defaults(provider: &mut OAuthProvider) {
    if provider.authorization_url.is_none() {
        provider.authorization_url =
            Some("https://accounts.google.com/o/oauth2/v2/auth".to_string());
    }
    if provider.token_url.is_none() {
        provider.token_url = Some("https://oauth2.googleapis.com/token".to_string());
    }
    if provider.user_info_url.is_none() {
        provider.user_info_url = Some("https://www.googleapis.com/oauth2/v2/userinfo".to_string());
    }
    if provider.scopes.is_empty() {
        provider.scopes = vec![
            "openid".to_string(),
            "email".to_string(),
            "profile".to_string(),
        ];
    }
}

fn apply_github_defaults(provider: &mut OAuthProvider) {
    if provider.authorization_url.is_none() {
        provider.authorization_url = Some("https://github.com/login/oauth/authorize".to_string());
    }
    if provider.token_url.is_none() {
        provider.token_url = Some("https://github.com/login/oauth/access_token".to_string());
    }
    if provider.user_info_url.is_none() {
        provider.user_info_url = Some("https://api.github.com/user".to_string());
    }
    if provider.scopes.is_empty() {
        provider.scopes = vec!["user:email".to_string()];
    }
}
