use crate::{
    auth::oauth::{NormalizedIdentity, OAuthError, Provider},
    content::Recommendation,
    error::AppError,
    server::Server,
};
use axum::{Router, extract::State, response::Json, routing::get};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub text: String,
    #[serde(default)]
    pub github_token: Option<String>,
    #[serde(default)]
    pub google_token: Option<String>,
}

impl RecommendationRequest {
    /// The token to verify. A GitHub token wins when both are sent.
    fn credential(&self) -> Option<(Provider, &str)> {
        fn present(token: &Option<String>) -> Option<&str> {
            token
                .as_deref()
                .map(str::trim)
                .filter(|token| !token.is_empty())
        }

        present(&self.github_token)
            .map(|token| (Provider::GitHub, token))
            .or_else(|| present(&self.google_token).map(|token| (Provider::Google, token)))
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub message: &'static str,
    pub recommendation: Recommendation,
}

pub fn create_recommendation_routes() -> Router<Server> {
    Router::new().route(
        "/api/recommendations",
        get(list_recommendations).post(add_recommendation),
    )
}

async fn list_recommendations(
    State(server): State<Server>,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    Ok(Json(server.content.recommendations().await?))
}

async fn add_recommendation(
    State(server): State<Server>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Recommendation text must not be empty".to_string(),
        ));
    }

    let (provider, token) = request
        .credential()
        .ok_or_else(|| AppError::Unauthorized("Invalid or missing token".to_string()))?;

    let identity = server
        .oauth_service
        .verify_bearer_token(provider, token)
        .await
        .map_err(|e| match e {
            OAuthError::ProfileRejected(_) => {
                warn!(provider = %provider, "Recommendation token rejected by provider");
                AppError::Unauthorized("Invalid or missing token".to_string())
            }
            other => other.into(),
        })?;

    let recommendation = server
        .content
        .add_recommendation(recommendation_from(identity, request.text))
        .await?;
    info!(
        provider = %recommendation.provider,
        username = %recommendation.username,
        "Recommendation added"
    );

    Ok(Json(RecommendationResponse {
        message: "Recommendation added successfully!",
        recommendation,
    }))
}

fn recommendation_from(identity: NormalizedIdentity, text: String) -> Recommendation {
    Recommendation {
        name: identity.display_name,
        text,
        avatar: identity.avatar_url,
        username: identity.subject_id,
        provider: identity.provider,
        created_at: Utc::now(),
    }
}
