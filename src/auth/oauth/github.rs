use super::{
    GitHubProfile, OAuthError, Provider, ProviderProfile,
    providers::{
        OAuthProviderClient, authorization_url, client_credentials, request_access_token,
        request_profile,
    },
};
use crate::auth::config::OAuthProvider;
use async_trait::async_trait;
use oauth2::AccessToken;
use reqwest::Client;
use url::Url;

/// GitHub OAuth app client.
///
/// GitHub infers `response_type` and expects the access token in a
/// `token <value>` authorization header.
pub struct GitHubClient {
    credentials: OAuthProvider,
    http: Client,
}

impl GitHubClient {
    pub fn new(credentials: OAuthProvider, http: Client) -> Self {
        Self { credentials, http }
    }
}

#[async_trait]
impl OAuthProviderClient for GitHubClient {
    fn provider(&self) -> Provider {
        Provider::GitHub
    }

    fn credentials(&self) -> &OAuthProvider {
        &self.credentials
    }

    fn build_authorization_url(&self, state: &str) -> Result<Url, OAuthError> {
        authorization_url(Provider::GitHub, &self.credentials, state, &[])
    }

    async fn exchange_code_for_token(&self, code: &str) -> Result<AccessToken, OAuthError> {
        let (client_id, client_secret) = client_credentials(Provider::GitHub, &self.credentials)?;
        let redirect_uri = self.credentials.redirect_uri.as_deref().unwrap_or_default();

        request_access_token(
            &self.http,
            Provider::GitHub,
            &self.credentials,
            &[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ],
        )
        .await
    }

    async fn fetch_profile(&self, access_token: &AccessToken) -> Result<ProviderProfile, OAuthError> {
        request_profile::<GitHubProfile>(
            &self.http,
            Provider::GitHub,
            &self.credentials,
            format!("token {}", access_token.secret()),
        )
        .await
        .map(ProviderProfile::GitHub)
    }
}
