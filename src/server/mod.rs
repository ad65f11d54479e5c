pub mod config;
pub mod route_builder;

use crate::{
    auth::{
        AdminSessionStore, OAuthHealthChecker, OAuthService, StateTokenStore,
        sweeper::spawn_token_sweeper,
    },
    config::Config,
    content::{JsonContentStore, UploadStore},
    error::AppError,
    health::HealthService,
    mail::ContactService,
    metrics,
    routes::{
        create_admin_content_routes, create_admin_login_routes, create_admin_session_routes,
        create_admin_upload_routes, create_auth_routes, create_contact_routes,
        create_content_routes, create_health_routes, create_recommendation_routes,
        create_upload_file_routes,
    },
    server::route_builder::{RouteHelpers, middleware_factories::request_response_logger},
    shutdown::{ShutdownCoordinator, ShutdownManager},
    utils::request_id::request_id_middleware,
};
use axum::{Router, http::HeaderValue, middleware};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct Server {
    pub config: Arc<Config>,
    pub oauth_service: Arc<OAuthService>,
    pub admin_sessions: AdminSessionStore,
    pub content: Arc<JsonContentStore>,
    pub uploads: UploadStore,
    pub contact: Arc<ContactService>,
    pub health_service: Arc<HealthService>,
    pub shutdown_coordinator: Arc<ShutdownCoordinator>,
}

impl Server {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        // Initialize metrics if enabled
        if config.metrics.enabled {
            if let Err(e) = metrics::init_metrics_with_port(config.metrics.port) {
                error!(
                    "Failed to start metrics server on port {}: {}",
                    config.metrics.port, e
                );
                return Err(AppError::Internal(format!(
                    "Failed to start metrics server: {}",
                    e
                )));
            }
        }

        let state_ttl = i64::try_from(config.auth.state_ttl_seconds)
            .map_err(|_| AppError::Configuration("auth.state_ttl_seconds is too large".to_string()))?;
        let states = StateTokenStore::new(state_ttl);
        let oauth_service = Arc::new(OAuthService::new(&config, states)?);

        for provider in oauth_service.configured_providers() {
            info!(provider = %provider, "OAuth provider configured");
        }

        let admin_sessions = AdminSessionStore::new(
            config.admin.password.clone(),
            config.auth.admin_session_ttl_seconds,
        );
        if !admin_sessions.is_enabled() {
            warn!("No admin password configured, admin endpoints are disabled");
        }

        let content = Arc::new(JsonContentStore::new(config.content.path.clone()));
        let uploads = UploadStore::new(
            config.content.uploads_dir.clone(),
            config.content.max_upload_bytes,
        );
        let contact = Arc::new(ContactService::from_config(&config.smtp));

        // Initialize health service
        let health_service = Arc::new(HealthService::new());
        health_service
            .register(Arc::new(OAuthHealthChecker::new(oauth_service.clone())))
            .await;
        health_service.register(content.clone()).await;

        let shutdown_coordinator = Arc::new(ShutdownCoordinator::new());

        Ok(Self {
            config: Arc::new(config),
            oauth_service,
            admin_sessions,
            content,
            uploads,
            contact,
            health_service,
            shutdown_coordinator,
        })
    }

    pub async fn run(&self) -> Result<(), AppError> {
        let mut shutdown_manager = ShutdownManager::new(Duration::from_secs(30));

        let sweeper = spawn_token_sweeper(
            self.oauth_service.states().clone(),
            self.admin_sessions.clone(),
            Duration::from_secs(self.config.auth.cleanup_interval_seconds.max(1)),
            self.shutdown_coordinator.subscribe(),
        );
        shutdown_manager.register_background_task(sweeper, "token sweeper", 5);
        shutdown_manager.register_content_store(self.content.clone());

        let app = self.create_app();

        let host = self.config.server.host.as_str();
        let port = self.config.server.port;
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind to address: {}", e)))?;

        info!("Server listening on http://{}:{}", host, port);

        // Spawn shutdown signal handler
        let shutdown_coordinator_clone = self.shutdown_coordinator.clone();
        tokio::spawn(async move {
            shutdown_coordinator_clone.wait_for_shutdown_signal().await;
        });

        let shutdown_rx = self.shutdown_coordinator.subscribe();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let mut rx = shutdown_rx;
                let _ = rx.changed().await;
                info!("Graceful shutdown initiated");
            })
            .await;

        if let Err(e) = result {
            error!("Server error: {}", e);
        }

        // Stop the sweeper even when the server exited on its own
        self.shutdown_coordinator.initiate_shutdown();
        shutdown_manager.shutdown_all().await;
        info!("Server shutdown complete");

        Ok(())
    }

    // Creates an application router
    pub fn create_app(&self) -> Router {
        let app = Router::new()
            .merge(create_health_routes())
            .merge(create_auth_routes())
            .merge(create_admin_login_routes())
            .merge(create_content_routes())
            .merge(create_recommendation_routes())
            .merge(create_contact_routes())
            .merge(create_upload_file_routes())
            .merge(self.admin_routes())
            // All routes use Server as state
            .with_state(self.clone());

        let app = self.add_conditional_middleware(app);
        app.layer(middleware::from_fn(request_id_middleware))
            .layer(self.cors_layer())
    }

    /// Content mutations, uploads and the session check, all behind the
    /// admin gate.
    fn admin_routes(&self) -> Router<Server> {
        RouteHelpers::with_admin_auth(
            create_admin_content_routes()
                .merge(create_admin_session_routes())
                .merge(create_admin_upload_routes(self.uploads.max_bytes())),
            self,
        )
    }

    /// Helper method for adding conditional middleware
    fn add_conditional_middleware(&self, mut app: Router) -> Router {
        if self.config.metrics.enabled {
            app = app.layer(middleware::from_fn(metrics::metrics_middleware));
        }
        if self.config.logging.log_request {
            app = app.layer(middleware::from_fn(request_response_logger));
        }
        app
    }

    fn cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        match self.config.cors.origins() {
            None => layer.allow_origin(Any),
            Some(origins) => {
                let origins: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|origin| match HeaderValue::from_str(origin) {
                        Ok(value) => Some(value),
                        Err(_) => {
                            warn!(origin = %origin, "Ignoring invalid CORS origin");
                            None
                        }
                    })
                    .collect();
                layer.allow_origin(origins)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::X_ADMIN_TOKEN;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check_is_public() {
        let server = crate::test_utils::TestServerBuilder::new().build().await;
        let app = server.create_app();

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_mutation_without_token_is_rejected() {
        let server = crate::test_utils::TestServerBuilder::new()
            .with_admin_password("pw")
            .build()
            .await;
        let app = server.create_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/projects",
                serde_json::json!({"title": "Nope"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(server.content.projects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_public_and_gated_methods_share_a_path() {
        let server = crate::test_utils::TestServerBuilder::new()
            .with_admin_password("pw")
            .build()
            .await;
        let token = server.admin_sessions.login("pw").unwrap();
        let app = server.create_app();

        let mut request = json_request("POST", "/api/projects", serde_json::json!({"title": "Yes"}));
        request
            .headers_mut()
            .insert(&X_ADMIN_TOKEN, token.parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let request = Request::builder()
            .uri("/api/projects")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let server = crate::test_utils::TestServerBuilder::new().build().await;
        let app = server.create_app();

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/content")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }
}
