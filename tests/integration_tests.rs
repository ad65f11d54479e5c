//! End-to-end tests of the content API through the full router.

mod common;
use axum::http::{Method, StatusCode};
use common::{ADMIN_PASSWORD, RequestBuilder, TestHarness, helpers};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

#[tokio::test]
async fn test_banner_and_health() {
    let harness = TestHarness::new().await;

    let response = harness.make_request(RequestBuilder::get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = harness
        .make_request(RequestBuilder::get("/health?check=content"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = helpers::json_body(response).await;
    assert_eq!(body["checks"]["content"]["status"], "healthy");
}

#[tokio::test]
async fn test_admin_login() {
    let harness = TestHarness::new().await;

    let response = harness
        .make_request(RequestBuilder::json(
            Method::POST,
            "/api/admin/login",
            &json!({"password": "wrong"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = harness.admin_token().await;
    let response = harness
        .make_request(RequestBuilder::admin(Method::GET, "/api/admin/session", &token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Tokens are independent
    let second = harness.admin_token().await;
    assert_ne!(token, second);
    let response = harness
        .make_request(RequestBuilder::admin(Method::GET, "/api/admin/session", &token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_disabled_without_password() {
    let harness = TestHarness::with_config(|config| config.admin.password = None).await;

    let response = harness
        .make_request(RequestBuilder::json(
            Method::POST,
            "/api/admin/login",
            &json!({"password": ADMIN_PASSWORD}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_project_and_skill_management() {
    let harness = TestHarness::new().await;
    let token = harness.admin_token().await;

    let response = harness
        .make_request(RequestBuilder::admin_json(
            Method::POST,
            "/api/projects",
            &token,
            &json!({
                "title": "Chat app",
                "description": "Realtime chat",
                "tech": ["Rust", "WebSockets"],
                "repo": "https://github.com/example/chat"
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let project = helpers::json_body(response).await;
    let project_id = project["id"].as_str().unwrap().to_string();

    let response = harness
        .make_request(RequestBuilder::admin_json(
            Method::PUT,
            &format!("/api/projects/{project_id}"),
            &token,
            &json!({"title": "Chat app v2", "tech": ["Rust"]}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = harness
        .make_request(RequestBuilder::admin_json(
            Method::POST,
            "/api/skills",
            &token,
            &json!({"name": "PostgreSQL", "category": "db_stack", "image": "/img/pg.svg"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = harness
        .make_request(RequestBuilder::get("/api/content"))
        .await;
    let content = helpers::json_body(response).await;
    assert_eq!(content["projects"][0]["title"], "Chat app v2");
    assert_eq!(content["projects"][0]["id"], project_id.as_str());
    assert_eq!(content["skills"][0]["category"], "db_stack");

    let response = harness
        .make_request(RequestBuilder::admin(
            Method::DELETE,
            &format!("/api/projects/{project_id}"),
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = harness
        .make_request(RequestBuilder::admin_json(
            Method::PUT,
            &format!("/api/projects/{project_id}"),
            &token,
            &json!({"title": "Gone"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = harness.make_request(RequestBuilder::get("/api/stats")).await;
    let stats = helpers::json_body(response).await;
    assert_eq!(stats["projects_count"], 0);
    assert_eq!(stats["skills_count"], 1);
}

#[tokio::test]
async fn test_recommendations() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/google/user"))
        .and(header("authorization", "Bearer visitor-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "777",
            "email": "visitor@example.com",
            "name": "Visitor",
            "picture": "https://example.com/v.png"
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/github/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let harness = TestHarness::with_mock_providers(&mock_server.uri()).await;

    let response = harness
        .make_request(RequestBuilder::json(
            Method::POST,
            "/api/recommendations",
            &json!({"text": "Great engineer", "google_token": "visitor-token"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = helpers::json_body(response).await;
    assert_eq!(body["recommendation"]["username"], "google_777");
    assert_eq!(body["recommendation"]["name"], "Visitor");
    assert_eq!(body["recommendation"]["provider"], "google");

    let response = harness
        .make_request(RequestBuilder::json(
            Method::POST,
            "/api/recommendations",
            &json!({"text": "Spam", "github_token": "revoked"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = harness
        .make_request(RequestBuilder::json(
            Method::POST,
            "/api/recommendations",
            &json!({"text": "No token at all"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = harness
        .make_request(RequestBuilder::json(
            Method::POST,
            "/api/recommendations",
            &json!({"text": "  ", "google_token": "visitor-token"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = harness
        .make_request(RequestBuilder::get("/api/recommendations"))
        .await;
    let listed = helpers::json_body(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["text"], "Great engineer");
}

#[tokio::test]
async fn test_contact_form() {
    let harness = TestHarness::new().await;

    let response = harness
        .make_request(RequestBuilder::json(
            Method::POST,
            "/api/contact",
            &json!({"name": "Bob", "email": "bob@example.com", "message": "Hi!"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = harness.make_request(RequestBuilder::get("/api/stats")).await;
    let stats = helpers::json_body(response).await;
    assert_eq!(stats["contact_messages_count"], 1);
    assert_eq!(stats["sent_messages_count"], 0);
}

#[tokio::test]
async fn test_content_survives_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let content_path = dir.path().join("content.json");

    let first = TestHarness::with_config({
        let content_path = content_path.clone();
        move |config| config.content.path = content_path
    })
    .await;
    let token = first.admin_token().await;
    let response = first
        .make_request(RequestBuilder::admin_json(
            Method::POST,
            "/api/skills",
            &token,
            &json!({"name": "Docker", "category": "tools"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let second = TestHarness::with_config(move |config| config.content.path = content_path).await;
    let response = second.make_request(RequestBuilder::get("/api/skills")).await;
    let skills = helpers::json_body(response).await;
    assert_eq!(skills[0]["name"], "Docker");

    // Sessions do not survive a restart
    let response = second
        .make_request(RequestBuilder::admin(Method::GET, "/api/admin/session", &token))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
