use crate::{
    content::{ContentDocument, Project, ProjectInput, Skill, SkillInput},
    error::AppError,
    server::Server,
};
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
};
use uuid::Uuid;

pub fn create_content_routes() -> Router<Server> {
    Router::new()
        .route("/api/content", get(get_content))
        .route("/api/projects", get(list_projects))
        .route("/api/skills", get(list_skills))
}

/// Mutations; mounted behind the admin gate.
pub fn create_admin_content_routes() -> Router<Server> {
    Router::new()
        .route("/api/projects", post(create_project))
        .route("/api/projects/{id}", put(update_project).delete(delete_project))
        .route("/api/skills", post(create_skill))
        .route("/api/skills/{id}", put(update_skill).delete(delete_skill))
}

async fn get_content(State(server): State<Server>) -> Result<Json<ContentDocument>, AppError> {
    Ok(Json(server.content.load().await?))
}

async fn list_projects(State(server): State<Server>) -> Result<Json<Vec<Project>>, AppError> {
    Ok(Json(server.content.projects().await?))
}

async fn list_skills(State(server): State<Server>) -> Result<Json<Vec<Skill>>, AppError> {
    Ok(Json(server.content.skills().await?))
}

async fn create_project(
    State(server): State<Server>,
    Json(input): Json<ProjectInput>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let project = server.content.create_project(input).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn update_project(
    State(server): State<Server>,
    Path(id): Path<Uuid>,
    Json(input): Json<ProjectInput>,
) -> Result<Json<Project>, AppError> {
    Ok(Json(server.content.update_project(id, input).await?))
}

async fn delete_project(
    State(server): State<Server>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    server.content.delete_project(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_skill(
    State(server): State<Server>,
    Json(input): Json<SkillInput>,
) -> Result<(StatusCode, Json<Skill>), AppError> {
    let skill = server.content.create_skill(input).await?;
    Ok((StatusCode::CREATED, Json(skill)))
}

async fn update_skill(
    State(server): State<Server>,
    Path(id): Path<Uuid>,
    Json(input): Json<SkillInput>,
) -> Result<Json<Skill>, AppError> {
    Ok(Json(server.content.update_skill(id, input).await?))
}

async fn delete_skill(
    State(server): State<Server>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    server.content.delete_skill(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
