use crate::{error::AppError, server::Server};
use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub token: String,
}

pub fn create_admin_login_routes() -> Router<Server> {
    Router::new().route("/api/admin/login", post(admin_login_handler))
}

/// Routes that sit behind the admin gate.
pub fn create_admin_session_routes() -> Router<Server> {
    Router::new().route("/api/admin/session", get(admin_session_handler))
}

pub async fn admin_login_handler(
    State(server): State<Server>,
    Json(request): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, AppError> {
    let token = server.admin_sessions.login(&request.password)?;
    Ok(Json(AdminLoginResponse { token }))
}

/// Reached only with a valid token, so the admin UI can check a stored one.
pub async fn admin_session_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "valid": true }))
}
