use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::LOCATION},
    response::Response,
};
use portfolio_backend::{
    Config, Server,
    auth::{config::OAuthProvider, oauth::Provider},
};
use std::collections::HashMap;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

pub const ADMIN_PASSWORD: &str = "integration-admin-password";

/// Unified test harness: a full app over a throwaway content directory
pub struct TestHarness {
    #[allow(dead_code)]
    pub config: Config,
    #[allow(dead_code)]
    pub server: Server,
    pub app: Router,
    _dir: TempDir,
}

impl TestHarness {
    /// Harness with an admin password and no OAuth providers
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Harness with `customize` applied on top of the test defaults
    pub async fn with_config<F>(customize: F) -> Self
    where
        F: FnOnce(&mut Config),
    {
        let dir = TempDir::new().unwrap();

        let mut config = Config::default();
        config.content.path = dir.path().join("content.json");
        config.content.uploads_dir = dir.path().join("uploads");
        config.admin.password = Some(ADMIN_PASSWORD.to_string());
        config.frontend.callback_base_url = "http://frontend.test".to_string();
        config.metrics.enabled = false;
        customize(&mut config);
        config.oauth.apply_provider_defaults();

        let server = Server::new(config.clone()).await.unwrap();
        let app = server.create_app();

        Self {
            config,
            server,
            app,
            _dir: dir,
        }
    }

    /// Harness whose providers all talk to `mock_base`
    #[allow(dead_code)]
    pub async fn with_mock_providers(mock_base: &str) -> Self {
        let github = mock_provider(Provider::GitHub, mock_base);
        let google = mock_provider(Provider::Google, mock_base);
        Self::with_config(move |config| {
            config.oauth.github = github;
            config.oauth.google = google;
        })
        .await
    }

    /// Make request using the test app
    pub async fn make_request(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Log in through the API and return the admin token
    #[allow(dead_code)]
    pub async fn admin_token(&self) -> String {
        let response = self
            .make_request(RequestBuilder::json(
                Method::POST,
                "/api/admin/login",
                &serde_json::json!({ "password": ADMIN_PASSWORD }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        helpers::json_body(response).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

/// Provider settings pointing at `base/{provider}/...` on a mock server
#[allow(dead_code)]
pub fn mock_provider(provider: Provider, base: &str) -> OAuthProvider {
    OAuthProvider {
        client_id: Some(format!("{provider}-client-id")),
        client_secret: Some(format!("{provider}-client-secret")),
        redirect_uri: Some(format!("http://localhost:8000/api/auth/{provider}/callback")),
        scopes: vec!["profile".to_string()],
        authorization_url: Some(format!("{base}/{provider}/authorize")),
        token_url: Some(format!("{base}/{provider}/token")),
        user_info_url: Some(format!("{base}/{provider}/user")),
    }
}

/// Unified request builder for the test suites
pub struct RequestBuilder;

impl RequestBuilder {
    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub fn json(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method(method)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// JSON request carrying `X-ADMIN-TOKEN`
    #[allow(dead_code)]
    pub fn admin_json(
        method: Method,
        uri: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> Request<Body> {
        let mut request = Self::json(method, uri, body);
        request
            .headers_mut()
            .insert("X-ADMIN-TOKEN", token.parse().unwrap());
        request
    }

    /// Body-less request carrying `X-ADMIN-TOKEN`
    #[allow(dead_code)]
    pub fn admin(method: Method, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method(method)
            .header("X-ADMIN-TOKEN", token)
            .body(Body::empty())
            .unwrap()
    }
}

/// Helper functions for common test patterns
pub mod helpers {
    use super::*;

    pub async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Assert a 303 to the frontend callback page and return its query
    #[allow(dead_code)]
    pub fn callback_redirect(response: &Response, provider: Provider) -> HashMap<String, String> {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[LOCATION].to_str().unwrap();
        let url = Url::parse(location).unwrap();
        assert_eq!(url.path(), format!("/{provider}/callback.html"));
        url.query_pairs().into_owned().collect()
    }

    /// Assert response status with context
    #[allow(dead_code)]
    pub fn assert_status_with_context(response: &Response, expected: StatusCode, context: &str) {
        assert_eq!(
            response.status(),
            expected,
            "Expected {} for {}, got {}",
            expected,
            context,
            response.status()
        );
    }
}
