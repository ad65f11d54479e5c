use crate::{config::ConfigStatus, error::AppError, server::Server};
use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct HealthCheckQuery {
    #[serde(default)]
    check: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    projects_count: usize,
    skills_count: usize,
    recommendations_count: usize,
    contact_messages_count: u64,
    sent_messages_count: u64,
}

/// Health check plus the small informational endpoints.
///
/// The health service aggregates checks from every registered component
/// (OAuth providers, content store).
pub fn create_health_routes() -> Router<Server> {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health_check))
        .route("/health/components", get(health_components))
        .route("/api/stats", get(stats))
        .route("/api/config/check", get(config_check))
}

async fn banner() -> Json<Value> {
    Json(serde_json::json!({
        "message": "Portfolio API is running",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_check(
    State(server): State<Server>,
    Query(params): Query<HealthCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let filter = params.check.as_deref();
    let health_response = server.health_service.check_health(filter).await;

    let response_json = serde_json::to_value(&health_response)
        .map_err(|e| AppError::Internal(format!("Failed to serialize health response: {}", e)))?;

    Ok(Json(response_json))
}

/// Registered check names and their static descriptions.
async fn health_components(State(server): State<Server>) -> Json<Value> {
    Json(serde_json::json!({
        "components": server.health_service.registered_checkers().await,
        "info": server.health_service.component_info().await,
    }))
}

async fn stats(State(server): State<Server>) -> Result<Json<StatsResponse>, AppError> {
    let content = server.content.stats().await?;
    let contact = server.contact.stats();
    Ok(Json(StatsResponse {
        projects_count: content.projects_count,
        skills_count: content.skills_count,
        recommendations_count: content.recommendations_count,
        contact_messages_count: contact.contact_messages_count,
        sent_messages_count: contact.sent_messages_count,
    }))
}

async fn config_check(State(server): State<Server>) -> Json<ConfigStatus> {
    Json(server.config.status())
}
