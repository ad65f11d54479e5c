use crate::{
    auth::{config::OAuthProvider, oauth::Provider},
    config::Config,
    server::Server,
};

/// Test server builder with isolated content and upload directories
pub struct TestServerBuilder {
    config: Config,
    admin_password: Option<String>,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            admin_password: None,
        }
    }

    /// Set a custom configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Enable admin login with `password`
    pub fn with_admin_password(mut self, password: &str) -> Self {
        self.admin_password = Some(password.to_string());
        self
    }

    /// Replace one provider's credentials and endpoints, e.g. to point it at
    /// a mock server
    pub fn with_oauth_provider(mut self, provider: Provider, settings: OAuthProvider) -> Self {
        match provider {
            Provider::GitHub => self.config.oauth.github = settings,
            Provider::Google => self.config.oauth.google = settings,
        }
        self
    }

    /// Build the test server with configured settings
    pub async fn build(self) -> Server {
        let mut config = self.config;

        let dir = tempfile::Builder::new()
            .prefix("portfolio-test-")
            .tempdir()
            .unwrap()
            .keep();
        config.content.path = dir.join("content.json");
        config.content.uploads_dir = dir.join("uploads");

        if self.admin_password.is_some() {
            config.admin.password = self.admin_password;
        }

        // Disable metrics for tests
        config.metrics.enabled = false;
        config.logging.log_request = false;
        config.oauth.apply_provider_defaults();

        Server::new(config).await.unwrap()
    }
}

impl Default for TestServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Fully configured provider credentials whose endpoints live under `base`.
pub fn mock_provider(provider: Provider, base: &str) -> OAuthProvider {
    OAuthProvider {
        client_id: Some(format!("{provider}-client-id")),
        client_secret: Some(format!("{provider}-client-secret")),
        redirect_uri: Some(format!("http://localhost:8000/api/auth/{provider}/callback")),
        scopes: vec!["user:email".to_string()],
        authorization_url: Some(format!("{base}/authorize")),
        token_url: Some(format!("{base}/token")),
        user_info_url: Some(format!("{base}/user")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_builder_default() {
        let server = TestServerBuilder::new().build().await;

        assert!(!server.config.metrics.enabled);
        assert!(!server.admin_sessions.is_enabled());
        assert!(server.oauth_service.configured_providers().is_empty());
        assert!(server.content.load().await.unwrap().projects.is_empty());
    }

    #[tokio::test]
    async fn test_servers_do_not_share_content() {
        let first = TestServerBuilder::new().build().await;
        let second = TestServerBuilder::new().build().await;

        assert_ne!(first.content.path(), second.content.path());
        assert_ne!(first.uploads.root(), second.uploads.root());
    }

    #[tokio::test]
    async fn test_with_oauth_provider() {
        let server = TestServerBuilder::new()
            .with_oauth_provider(Provider::GitHub, mock_provider(Provider::GitHub, "http://127.0.0.1:1"))
            .build()
            .await;

        assert_eq!(server.oauth_service.configured_providers(), vec![Provider::GitHub]);
        assert!(server.admin_sessions.login("anything").is_err());
    }
}
