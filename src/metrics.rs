use crate::auth::oauth::Provider;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;
use tracing::info;

/// Install the Prometheus recorder and its scrape listener on `port`.
pub fn init_metrics_with_port(
    port: u16,
) -> Result<PrometheusHandle, Box<dyn std::error::Error + Send + Sync>> {
    let handle = PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .add_global_label("service", env!("CARGO_PKG_NAME"))
        .install_recorder()?;

    info!("Metrics server started on :{}/metrics", port);
    Ok(handle)
}

/// Middleware to collect HTTP request metrics
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    gauge!("http_requests_active").increment(1.0);
    let response = next.run(req).await;
    gauge!("http_requests_active").decrement(1.0);

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", response.status().as_u16().to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());

    if response.status().is_server_error() {
        counter!("http_errors_total", &labels[..2]).increment(1);
    }

    response
}

/// Count a finished OAuth callback; `outcome` is `success` or the error code
/// the browser was redirected with.
pub fn track_oauth_callback(provider: Provider, outcome: &'static str) {
    counter!(
        "oauth_callbacks_total",
        "provider" => provider.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Count an admin login attempt by result (`success`, `failure`, `disabled`).
pub fn track_admin_login(result: &'static str) {
    counter!("admin_logins_total", "result" => result).increment(1);
}

/// Current number of pending state tokens and open admin sessions.
pub fn update_token_gauges(pending_states: usize, admin_sessions: usize) {
    gauge!("oauth_pending_states").set(pending_states as f64);
    gauge!("admin_sessions_active").set(admin_sessions as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    #[test]
    fn test_tracking_without_recorder() {
        // Without an installed recorder these are no-ops.
        track_oauth_callback(Provider::GitHub, "success");
        track_oauth_callback(Provider::Google, "invalid_state");
        track_admin_login("failure");
        update_token_gauges(3, 1);
    }

    #[tokio::test]
    async fn test_metrics_middleware_passes_response_through() {
        let app = Router::new()
            .route("/api/projects", get(|| async { (StatusCode::CREATED, "ok") }))
            .layer(middleware::from_fn(metrics_middleware));

        let response = app
            .oneshot(Request::builder().uri("/api/projects").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
