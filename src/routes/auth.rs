use crate::{
    auth::oauth::{CallbackQuery, LoginResponse, NormalizedIdentity, Provider},
    error::AppError,
    server::Server,
};
use axum::{
    Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    response::{Json, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct VerifyTokenRequest {
    #[serde(default)]
    pub token: String,
}

pub fn create_auth_routes() -> Router<Server> {
    Router::new()
        .route("/api/auth/{provider}/login", get(login_handler))
        .route("/api/auth/{provider}/callback", get(callback_handler))
        .route("/api/auth/{provider}", post(verify_token_handler))
}

/// `GET /api/auth/{provider}/login`
pub async fn login_handler(
    State(server): State<Server>,
    Path(provider): Path<String>,
) -> Result<Json<LoginResponse>, AppError> {
    let provider: Provider = provider.parse()?;
    Ok(Json(server.oauth_service.start_login(provider)?))
}

/// `GET /api/auth/{provider}/callback`: always answers with a redirect to the
/// frontend callback page once the provider name is known. A query string that
/// does not parse carries no usable state and ends as `invalid_state`.
pub async fn callback_handler(
    State(server): State<Server>,
    Path(provider): Path<String>,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Result<Redirect, AppError> {
    let provider: Provider = provider.parse()?;
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            warn!(provider = %provider, "Malformed OAuth callback query: {}", rejection);
            CallbackQuery::default()
        }
    };
    let target = server.oauth_service.handle_callback(provider, query).await;
    Ok(Redirect::to(&target))
}

/// `POST /api/auth/{provider}`: resolve a provider access token to an identity.
pub async fn verify_token_handler(
    State(server): State<Server>,
    Path(provider): Path<String>,
    Json(request): Json<VerifyTokenRequest>,
) -> Result<Json<VerifiedUser>, AppError> {
    let provider: Provider = provider.parse()?;
    let token = request.token.trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized("Missing token".to_string()));
    }

    let identity = server
        .oauth_service
        .verify_bearer_token(provider, token)
        .await?;
    Ok(Json(identity.into()))
}

/// Identity shape returned to the frontend by token verification.
#[derive(Debug, serde::Serialize)]
pub struct VerifiedUser {
    pub login: String,
    pub name: String,
    pub avatar_url: String,
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<NormalizedIdentity> for VerifiedUser {
    fn from(identity: NormalizedIdentity) -> Self {
        Self {
            login: identity.subject_id,
            name: identity.display_name,
            avatar_url: identity.avatar_url,
            provider: identity.provider,
            email: identity.email,
        }
    }
}
