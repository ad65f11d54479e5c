use crate::{auth::middleware::admin_middleware, server::Server};
use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
};

/// Helper functions for creating routes with common middleware patterns
pub struct RouteHelpers;

impl RouteHelpers {
    /// Put routes behind the `X-ADMIN-TOKEN` gate
    pub fn with_admin_auth(routes: Router<Server>, server: &Server) -> Router<Server> {
        routes.layer(middleware::from_fn_with_state(
            server.clone(),
            admin_middleware,
        ))
    }
}

/// Middleware factory functions for common patterns
pub mod middleware_factories {
    use super::*;
    use crate::{auth::X_ADMIN_TOKEN, utils::request_id::RequestIdExt};
    use axum::body::Body;
    use tracing::info;

    /// Request/response logging for API routes; uploads are skipped.
    pub async fn request_response_logger(req: Request<Body>, next: Next) -> Response {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let request_id = req.extensions().request_id();

        let is_api_route = path.starts_with("/api") || path.starts_with("/health");
        if !is_api_route {
            return next.run(req).await;
        }

        // Presence only; the token value is never logged.
        let admin = req.headers().contains_key(&X_ADMIN_TOKEN);

        info!(
            method = %method,
            path = %path,
            admin = admin,
            request_id = %request_id,
            "API request"
        );

        let start = std::time::Instant::now();
        let response = next.run(req).await;
        let duration = start.elapsed();

        info!(
            method = %method,
            path = %path,
            status = %response.status().as_u16(),
            latency_ms = %duration.as_millis(),
            request_id = %request_id,
            "API response"
        );

        response
    }
}
