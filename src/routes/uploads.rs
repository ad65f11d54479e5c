use crate::{
    content::{StoredUpload, UploadKind},
    error::AppError,
    server::Server,
};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartError},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use tokio::fs;
use tracing::{debug, warn};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_upload_file_routes() -> Router<Server> {
    Router::new().route("/uploads/{*path}", get(serve_upload))
}

/// Upload endpoints; mounted behind the admin gate.
pub fn create_admin_upload_routes(max_upload_bytes: usize) -> Router<Server> {
    Router::new()
        .route("/api/upload/cv", post(upload_cv))
        .route("/api/upload/hero", post(upload_hero))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
}

async fn upload_cv(
    State(server): State<Server>,
    multipart: Multipart,
) -> Result<Json<StoredUpload>, AppError> {
    let bytes = read_file_field(multipart).await?;
    let stored = server.uploads.save(UploadKind::Cv, &bytes).await?;
    server.content.set_cv_url(stored.url.clone()).await?;
    Ok(Json(stored))
}

async fn upload_hero(
    State(server): State<Server>,
    multipart: Multipart,
) -> Result<Json<StoredUpload>, AppError> {
    let bytes = read_file_field(multipart).await?;
    let stored = server.uploads.save(UploadKind::HeroImage, &bytes).await?;
    server.content.set_hero_image_url(stored.url.clone()).await?;
    Ok(Json(stored))
}

/// Body of the multipart part named `file`.
async fn read_file_field(mut multipart: Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            let bytes = field.bytes().await.map_err(multipart_error)?;
            return Ok(bytes.to_vec());
        }
    }
    Err(AppError::BadRequest("Missing multipart field 'file'".to_string()))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

async fn serve_upload(State(server): State<Server>, Path(path): Path<String>) -> Response {
    debug!("Serving upload: {}", path);

    let Some(file_path) = server.uploads.resolve(&path) else {
        warn!("Path traversal attempt blocked: {}", path);
        return (StatusCode::BAD_REQUEST, "Invalid path").into_response();
    };

    match fs::read(&file_path).await {
        Ok(content) => serve_file_content(&path, content),
        Err(_) => (StatusCode::NOT_FOUND, "File not found").into_response(),
    }
}

fn serve_file_content(path: &str, content: Vec<u8>) -> Response {
    let mut headers = HeaderMap::new();

    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(content_type.essence_str()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );

    (headers, content).into_response()
}
