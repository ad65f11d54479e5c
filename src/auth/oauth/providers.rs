use super::{
    NormalizedIdentity, OAuthError, Provider, ProviderProfile, github::GitHubClient,
    google::GoogleClient,
};
use crate::auth::config::{OAuthConfig, OAuthProvider};
use async_trait::async_trait;
use oauth2::AccessToken;
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::{Deserialize, de::DeserializeOwned};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::{debug, warn};
use url::Url;

/// Provider-specific half of the authorization-code flow.
#[async_trait]
pub trait OAuthProviderClient: Send + Sync {
    fn provider(&self) -> Provider;

    fn credentials(&self) -> &OAuthProvider;

    /// Client id and secret are both present.
    fn is_configured(&self) -> bool {
        self.credentials().is_configured()
    }

    /// Consent page URL carrying `state`. Fails before building anything when
    /// the client id is unset.
    fn build_authorization_url(&self, state: &str) -> Result<Url, OAuthError>;

    async fn exchange_code_for_token(&self, code: &str) -> Result<AccessToken, OAuthError>;

    async fn fetch_profile(&self, access_token: &AccessToken) -> Result<ProviderProfile, OAuthError>;

    fn normalize(&self, profile: ProviderProfile) -> NormalizedIdentity {
        profile.normalize()
    }
}

/// Build the GitHub and Google clients sharing one HTTP client.
pub fn initialize_oauth_clients(
    config: &OAuthConfig,
) -> Result<HashMap<Provider, Arc<dyn OAuthProviderClient>>, OAuthError> {
    let http = build_http_client(Duration::from_secs(config.http_timeout_seconds))?;

    let mut clients: HashMap<Provider, Arc<dyn OAuthProviderClient>> = HashMap::new();
    clients.insert(
        Provider::GitHub,
        Arc::new(GitHubClient::new(config.github.clone(), http.clone())),
    );
    clients.insert(
        Provider::Google,
        Arc::new(GoogleClient::new(config.google.clone(), http)),
    );
    Ok(clients)
}

/// HTTP client for server-to-server provider calls.
pub fn build_http_client(timeout: Duration) -> Result<Client, OAuthError> {
    reqwest::ClientBuilder::new()
        // Following redirects opens the client up to SSRF vulnerabilities.
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| OAuthError::Internal(format!("reqwest build error: {e}")))
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Assemble the consent URL from the provider's credentials.
pub(super) fn authorization_url(
    provider: Provider,
    credentials: &OAuthProvider,
    state: &str,
    extra_params: &[(&str, &str)],
) -> Result<Url, OAuthError> {
    let client_id = credentials
        .client_id()
        .ok_or(OAuthError::NotConfigured(provider))?;

    let base = credentials.authorization_url.as_deref().ok_or_else(|| {
        OAuthError::Internal(format!("Authorization URL not configured for {provider}"))
    })?;
    let mut url = Url::parse(base).map_err(|e| {
        OAuthError::Internal(format!("Invalid authorization URL for {provider}: {e}"))
    })?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("client_id", client_id);
        if let Some(redirect_uri) = credentials.redirect_uri.as_deref() {
            query.append_pair("redirect_uri", redirect_uri);
        }
        query.append_pair("scope", &credentials.scopes.join(" "));
        for (key, value) in extra_params {
            query.append_pair(key, value);
        }
        query.append_pair("state", state);
    }

    Ok(url)
}

/// Client id and secret, or a configuration error.
pub(super) fn client_credentials(
    provider: Provider,
    credentials: &OAuthProvider,
) -> Result<(&str, &str), OAuthError> {
    match (credentials.client_id(), credentials.client_secret()) {
        (Some(id), Some(secret)) => Ok((id, secret)),
        _ => Err(OAuthError::NotConfigured(provider)),
    }
}

/// POST the code-exchange form and pull the access token out of the answer.
pub(super) async fn request_access_token(
    http: &Client,
    provider: Provider,
    credentials: &OAuthProvider,
    form: &[(&str, &str)],
) -> Result<AccessToken, OAuthError> {
    let token_url = credentials
        .token_url
        .as_deref()
        .ok_or_else(|| OAuthError::Internal(format!("Token URL not configured for {provider}")))?;

    let response = http
        .post(token_url)
        .header(ACCEPT, "application/json")
        .form(form)
        .send()
        .await
        .map_err(|e| OAuthError::TokenExchange(describe_transport_error(&e)))?;

    let status = response.status();
    if !status.is_success() {
        warn!(provider = %provider, status = %status, "Token endpoint returned an error status");
        return Err(OAuthError::TokenExchange(format!(
            "token endpoint returned status {status}"
        )));
    }

    let body: TokenEndpointResponse = response
        .json()
        .await
        .map_err(|e| OAuthError::TokenExchange(format!("malformed token response: {e}")))?;

    match body.access_token.filter(|token| !token.is_empty()) {
        Some(token) => {
            debug!(provider = %provider, "Exchanged authorization code for access token");
            Ok(AccessToken::new(token))
        }
        None => {
            warn!(
                provider = %provider,
                error = body.error.as_deref().unwrap_or("none"),
                error_description = body.error_description.as_deref().unwrap_or(""),
                "Token response carried no access token"
            );
            Err(OAuthError::MissingAccessToken)
        }
    }
}

/// GET the user-info endpoint with a ready-made `Authorization` value.
pub(super) async fn request_profile<T: DeserializeOwned>(
    http: &Client,
    provider: Provider,
    credentials: &OAuthProvider,
    authorization: String,
) -> Result<T, OAuthError> {
    let user_info_url = credentials.user_info_url.as_deref().ok_or_else(|| {
        OAuthError::Internal(format!("User info URL not configured for {provider}"))
    })?;

    let response = http
        .get(user_info_url)
        .header(AUTHORIZATION, authorization)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| OAuthError::Profile(describe_transport_error(&e)))?;

    let status = response.status();
    if !status.is_success() {
        warn!(provider = %provider, status = %status, "User info request failed");
        return Err(OAuthError::ProfileRejected(status.as_u16()));
    }

    response
        .json()
        .await
        .map_err(|e| OAuthError::Profile(format!("failed to parse user info: {e}")))
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else {
        format!("request failed: {err}")
    }
}
