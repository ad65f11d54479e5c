use super::{
    GoogleProfile, OAuthError, Provider, ProviderProfile,
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

pub struct GoogleClient {
    credentials: OAuthProvider,
    http: Client,
}

impl GoogleClient {
    pub fn new(credentials: OAuthProvider, http: Client) -> Self {
        Self { credentials, http }
    }
}

#[async_trait]
impl OAuthProviderClient for GoogleClient {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn credentials(&self) -> &OAuthProvider {
        &self.credentials
    }

    fn build_authorization_url(&self, state: &str) -> Result<Url, OAuthError> {
        authorization_url(
            Provider::Google,
            &self.credentials,
            state,
            &[("response_type", "code")],
        )
    }

    async fn exchange_code_for_token(&self, code: &str) -> Result<AccessToken, OAuthError> {
        let (client_id, client_secret) = client_credentials(Provider::Google, &self.credentials)?;
        let redirect_uri = self.credentials.redirect_uri.as_deref().unwrap_or_default();

        request_access_token(
            &self.http,
            Provider::Google,
            &self.credentials,
            &[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ],
        )
        .await
    }

    async fn fetch_profile(&self, access_token: &AccessToken) -> Result<ProviderProfile, OAuthError> {
        request_profile::<GoogleProfile>(
            &self.http,
            Provider::Google,
            &self.credentials,
            format!("Bearer {}", access_token.secret()),
        )
        .await
        .map(ProviderProfile::Google)
    }
}
