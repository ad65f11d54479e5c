use crate::error::AppError;
use crate::server::Server;
use crate::utils::request_id::RequestIdExt;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{trace, warn};

/// Admin gate for content-mutating routes.
///
/// Runs before the handler, so a rejected request never reaches any
/// read-modify-write of the content store.
pub async fn admin_middleware(
    State(server): State<Server>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let request_id = request.extensions().request_id();

    if let Err(e) = server.admin_sessions.authorize(request.headers()) {
        warn!(
            request_id = %request_id,
            method = %request.method(),
            path = %request.uri().path(),
            "Admin access denied"
        );
        return Err(e.into());
    }

    trace!(request_id = %request_id, "Admin access granted");
    Ok(next.run(request).await)
}
