use super::{
    NormalizedIdentity, OAuthError, OAuthProviderClient, Provider, StateTokenStore,
    initialize_oauth_clients,
};
use crate::{config::Config, metrics::track_oauth_callback};
use oauth2::AccessToken;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, warn};
use url::form_urlencoded;

/// Response of `GET /api/auth/{provider}/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub auth_url: String,
}

/// Query string the provider sends back to the callback endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Drives the login redirect, the callback and direct token verification.
pub struct OAuthService {
    clients: HashMap<Provider, Arc<dyn OAuthProviderClient>>,
    states: StateTokenStore,
    callback_base_url: String,
}

impl OAuthService {
    pub fn new(config: &Config, states: StateTokenStore) -> Result<Self, OAuthError> {
        let clients = initialize_oauth_clients(&config.oauth)?;
        Ok(Self::with_clients(
            clients,
            states,
            config.frontend.callback_base_url.clone(),
        ))
    }

    pub fn with_clients(
        clients: HashMap<Provider, Arc<dyn OAuthProviderClient>>,
        states: StateTokenStore,
        callback_base_url: impl Into<String>,
    ) -> Self {
        Self {
            clients,
            states,
            callback_base_url: callback_base_url.into(),
        }
    }

    pub fn states(&self) -> &StateTokenStore {
        &self.states
    }

    fn client(&self, provider: Provider) -> Result<&Arc<dyn OAuthProviderClient>, OAuthError> {
        self.clients
            .get(&provider)
            .ok_or_else(|| OAuthError::Internal(format!("No client registered for {provider}")))
    }

    pub fn is_configured(&self, provider: Provider) -> bool {
        self.clients
            .get(&provider)
            .is_some_and(|client| client.is_configured())
    }

    pub fn configured_providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|provider| self.is_configured(*provider))
            .collect()
    }

    /// Issue a state token and build the consent URL for `provider`.
    pub fn start_login(&self, provider: Provider) -> Result<LoginResponse, OAuthError> {
        let client = self.client(provider)?;
        if client.credentials().client_id().is_none() {
            warn!(provider = %provider, "Login requested for provider without client id");
            return Err(OAuthError::NotConfigured(provider));
        }

        let state = self.states.issue(provider);
        match client.build_authorization_url(&state) {
            Ok(url) => {
                debug!(provider = %provider, "Issued OAuth state token");
                Ok(LoginResponse {
                    auth_url: url.into(),
                })
            }
            Err(e) => {
                // The flow can never complete, so do not leave the token pending.
                self.states.consume_if_valid(&state, provider);
                Err(e)
            }
        }
    }

    /// Complete the callback and return the frontend URL to redirect to.
    /// Never fails: every error is folded into the redirect's `error` code.
    pub async fn handle_callback(&self, provider: Provider, query: CallbackQuery) -> String {
        match self.complete_callback(provider, &query).await {
            Ok((identity, access_token)) => {
                info!(
                    provider = %provider,
                    login = %identity.subject_id,
                    "OAuth login completed"
                );
                track_oauth_callback(provider, "success");

                let mut pairs = vec![("success", "true")];
                pairs.extend(identity.query_pairs());
                pairs.push(("token", access_token.secret().as_str()));
                self.frontend_redirect(provider, pairs)
            }
            Err(e) => {
                let code = e.callback_code();
                warn!(provider = %provider, error_code = code, "OAuth callback failed: {}", e);
                track_oauth_callback(provider, code);

                let message = e.to_string();
                let mut pairs = vec![("error", code)];
                if code == "server_error" {
                    pairs.push(("message", message.as_str()));
                }
                self.frontend_redirect(provider, pairs)
            }
        }
    }

    async fn complete_callback(
        &self,
        provider: Provider,
        query: &CallbackQuery,
    ) -> Result<(NormalizedIdentity, AccessToken), OAuthError> {
        let client = self.client(provider)?;
        if !client.is_configured() {
            return Err(OAuthError::NotConfigured(provider));
        }

        let state = query.state.as_deref().unwrap_or_default();
        if !self.states.consume_if_valid(state, provider) {
            return Err(OAuthError::InvalidState);
        }

        if let Some(error) = query.error.as_deref() {
            return Err(OAuthError::TokenExchange(format!(
                "provider returned error: {error}"
            )));
        }
        let code = query
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or_else(|| OAuthError::TokenExchange("missing authorization code".to_string()))?;

        let access_token = client.exchange_code_for_token(code).await?;
        let profile = client.fetch_profile(&access_token).await?;
        Ok((client.normalize(profile), access_token))
    }

    /// Resolve a provider access token presented directly by the frontend.
    pub async fn verify_bearer_token(
        &self,
        provider: Provider,
        token: &str,
    ) -> Result<NormalizedIdentity, OAuthError> {
        let client = self.client(provider)?;
        let profile = client
            .fetch_profile(&AccessToken::new(token.to_string()))
            .await?;
        Ok(client.normalize(profile))
    }

    fn frontend_redirect(&self, provider: Provider, pairs: Vec<(&str, &str)>) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        format!(
            "{}/{}/callback.html?{}",
            self.callback_base_url.trim_end_matches('/'),
            provider,
            query
        )
    }
}
