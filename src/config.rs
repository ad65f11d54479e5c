use crate::{
    auth::{
        config::{AdminConfig, AuthConfig, OAuthConfig, OAuthProvider},
        oauth::Provider,
    },
    content::ContentConfig,
    mail::SmtpConfig,
    server::config::{CorsConfig, FrontendConfig, LoggingConfig, MetricsConfig, ServerConfig},
};
use config::{
    Config as ConfigBuilder, ConfigError, Environment, File, builder::DefaultState,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Flat environment variable names kept for deployments that predate the
/// `PORTFOLIO_` prefixed layout, mapped to their configuration keys.
const LEGACY_ENV_VARS: &[(&str, &str)] = &[
    ("GITHUB_CLIENT_ID", "oauth.github.client_id"),
    ("GITHUB_CLIENT_SECRET", "oauth.github.client_secret"),
    ("GITHUB_REDIRECT_URI", "oauth.github.redirect_uri"),
    ("GOOGLE_CLIENT_ID", "oauth.google.client_id"),
    ("GOOGLE_CLIENT_SECRET", "oauth.google.client_secret"),
    ("GOOGLE_REDIRECT_URI", "oauth.google.redirect_uri"),
    ("ADMIN_PASSWORD", "admin.password"),
    ("SMTP_SERVER", "smtp.server"),
    ("SMTP_PORT", "smtp.port"),
    ("SENDER_EMAIL", "smtp.sender_email"),
    ("SENDER_PASSWORD", "smtp.sender_password"),
    ("RECIPIENT_EMAIL", "smtp.recipient_email"),
    ("ALLOWED_ORIGINS", "cors.allowed_origins"),
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from `config.yaml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("config.yaml")
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if path.as_ref().exists() {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        builder = builder.add_source(
            Environment::with_prefix("PORTFOLIO")
                .prefix_separator("_")
                .separator("__"),
        );

        builder = apply_legacy_env(builder, |name| std::env::var(name).ok())?;

        let mut config: Config = builder.build()?.try_deserialize()?;
        config.oauth.apply_provider_defaults();
        Ok(config)
    }

    /// Whether an admin password is set; admin login is disabled otherwise.
    pub fn admin_enabled(&self) -> bool {
        self.admin
            .password
            .as_deref()
            .is_some_and(|password| !password.is_empty())
    }

    /// What is configured, without any secret values.
    pub fn status(&self) -> ConfigStatus {
        ConfigStatus {
            github_oauth: ProviderStatus::from(self.oauth.provider(Provider::GitHub)),
            google_oauth: ProviderStatus::from(self.oauth.provider(Provider::Google)),
            email: EmailStatus {
                smtp_configured: self.smtp.is_configured(),
            },
            admin_enabled: self.admin_enabled(),
            metrics_enabled: self.metrics.enabled,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigStatus {
    pub github_oauth: ProviderStatus,
    pub google_oauth: ProviderStatus,
    pub email: EmailStatus,
    pub admin_enabled: bool,
    pub metrics_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub client_id_configured: bool,
    pub client_secret_configured: bool,
    pub redirect_uri: Option<String>,
}

impl From<&OAuthProvider> for ProviderStatus {
    fn from(provider: &OAuthProvider) -> Self {
        Self {
            client_id_configured: provider.client_id().is_some(),
            client_secret_configured: provider.client_secret().is_some(),
            redirect_uri: provider.redirect_uri.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailStatus {
    pub smtp_configured: bool,
}

/// Layer the legacy flat variables on top of everything else. Empty values
/// are ignored so that `GITHUB_CLIENT_ID=` does not mask a file setting.
fn apply_legacy_env<F>(
    mut builder: config::ConfigBuilder<DefaultState>,
    lookup: F,
) -> Result<config::ConfigBuilder<DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (var, key) in LEGACY_ENV_VARS {
        let value = lookup(var).filter(|value| !value.trim().is_empty());
        builder = builder.set_override_option(*key, value)?;
    }
    Ok(builder)
}
