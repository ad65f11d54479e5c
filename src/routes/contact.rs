use crate::{error::AppError, mail::ContactMessage, server::Server};
use axum::{Router, extract::State, response::Json, routing::post};
use serde_json::{Value, json};

pub fn create_contact_routes() -> Router<Server> {
    Router::new().route("/api/contact", post(contact_handler))
}

/// Always answers 200 once the message is valid; delivery problems are
/// logged, not reported.
async fn contact_handler(
    State(server): State<Server>,
    Json(message): Json<ContactMessage>,
) -> Result<Json<Value>, AppError> {
    message.validate().map_err(AppError::BadRequest)?;
    let outcome = server.contact.submit(&message).await;
    Ok(Json(json!({ "message": outcome.message() })))
}
