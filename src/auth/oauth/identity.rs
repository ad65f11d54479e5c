use super::Provider;
use serde::{Deserialize, Serialize};

/// Display name used for Google accounts that do not expose a name.
pub const GOOGLE_DEFAULT_DISPLAY_NAME: &str = "Usuário Google";

/// Prefix applied to Google ids so they never collide with GitHub logins.
pub const GOOGLE_SUBJECT_PREFIX: &str = "google_";

/// Subset of `GET https://api.github.com/user`
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubProfile {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Subset of `GET https://www.googleapis.com/oauth2/v2/userinfo`
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub verified_email: Option<bool>,
}

/// Raw profile as returned by one of the providers.
#[derive(Debug, Clone)]
pub enum ProviderProfile {
    GitHub(GitHubProfile),
    Google(GoogleProfile),
}

/// Provider-independent view of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedIdentity {
    pub provider: Provider,
    pub subject_id: String,
    pub display_name: String,
    pub avatar_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ProviderProfile {
    pub fn provider(&self) -> Provider {
        match self {
            ProviderProfile::GitHub(_) => Provider::GitHub,
            ProviderProfile::Google(_) => Provider::Google,
        }
    }

    pub fn normalize(self) -> NormalizedIdentity {
        match self {
            ProviderProfile::GitHub(profile) => NormalizedIdentity {
                provider: Provider::GitHub,
                display_name: present(profile.name).unwrap_or_else(|| profile.login.clone()),
                subject_id: profile.login,
                avatar_url: profile.avatar_url.unwrap_or_default(),
                email: present(profile.email),
            },
            ProviderProfile::Google(profile) => NormalizedIdentity {
                provider: Provider::Google,
                subject_id: format!("{GOOGLE_SUBJECT_PREFIX}{}", profile.id),
                display_name: present(profile.name)
                    .unwrap_or_else(|| GOOGLE_DEFAULT_DISPLAY_NAME.to_string()),
                avatar_url: profile.picture.unwrap_or_default(),
                email: present(profile.email),
            },
        }
    }
}

impl NormalizedIdentity {
    /// Query parameters describing this identity on the frontend callback page.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("provider", self.provider.as_str()),
            ("login", self.subject_id.as_str()),
            ("name", self.display_name.as_str()),
            ("avatar_url", self.avatar_url.as_str()),
        ];
        if let Some(email) = &self.email {
            pairs.push(("email", email.as_str()));
        }
        pairs
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
