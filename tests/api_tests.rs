use serde_json::{Value, json};
use std::sync::Arc;
use tradepost::api;
use tradepost::server::Server;
use tradepost::settings::parse_settings;
use warp::Filter;
use warp::http::StatusCode;

/// Fake service backends (settings/test.toml): the router, auth gate,
/// rate limiter, and error mapping run for real; no database is touched.
async fn spawn_server() -> Arc<Server> {
    let settings = parse_settings(Some("settings/test.toml")).expect("test settings");
    Arc::new(
        Server::try_new(&settings)
            .await
            .expect("failed to build server"),
    )
}

macro_rules! app {
    ($server:expr) => {
        warp::path("api")
            .and(warp::path("v1"))
            .and(api::v1::routes($server))
            .recover(api::v1::recover_error)
    };
}

fn body_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("response is not JSON")
}

#[tokio::test]
async fn health_is_public() {
    let server = spawn_server().await;
    let app = app!(server);

    let res = warp::test::request()
        .path("/api/v1/health")
        .reply(&app)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res.body());
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn register_returns_created_with_token() {
    let server = spawn_server().await;
    let app = app!(server);

    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/register")
        .json(&json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "Str0ng!Pass"
        }))
        .reply(&app)
        .await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let body = body_json(res.body());
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["username"], "alice");
    assert!(
        body["data"]["token"]
            .as_str()
            .unwrap()
            .starts_with("fake-token:")
    );
}

#[tokio::test]
async fn register_rejects_malformed_body() {
    let server = spawn_server().await;
    let app = app!(server);

    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/register")
        .header("content-type", "application/json")
        .body("{\"username\": \"alice\"")
        .reply(&app)
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res.body());
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn login_returns_token() {
    let server = spawn_server().await;
    let app = app!(server);

    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/login")
        .json(&json!({"identifier": "alice", "password": "Str0ng!Pass"}))
        .reply(&app)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res.body());
    assert_eq!(body["success"], true);
    assert!(body["data"]["expires_at"].is_string());
}

#[tokio::test]
async fn profile_without_token_is_unauthorized() {
    let server = spawn_server().await;
    let app = app!(server);

    let res = warp::test::request()
        .path("/api/v1/profile")
        .reply(&app)
        .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(res.body());
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn profile_with_non_bearer_header_is_unauthorized() {
    let server = spawn_server().await;
    let app = app!(server);

    let res = warp::test::request()
        .path("/api/v1/profile")
        .header("authorization", "Token abc")
        .reply(&app)
        .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_with_garbage_token_is_unauthorized() {
    let server = spawn_server().await;
    let app = app!(server);

    let res = warp::test::request()
        .path("/api/v1/profile")
        .header("authorization", "Bearer garbage")
        .reply(&app)
        .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(res.body());
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn profile_with_token_succeeds() {
    let server = spawn_server().await;
    let app = app!(server);

    let res = warp::test::request()
        .path("/api/v1/profile")
        .header("authorization", "Bearer fake-token:alice")
        .reply(&app)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res.body());
    assert_eq!(body["success"], true);
    assert!(body["data"]["user"]["username"].is_string());
}

#[tokio::test]
async fn verify_reports_the_authed_user() {
    let server = spawn_server().await;
    let app = app!(server);

    let res = warp::test::request()
        .path("/api/v1/verify")
        .header("authorization", "Bearer fake-token:alice")
        .reply(&app)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_does_not_revoke_the_token() {
    let server = spawn_server().await;
    let app = app!(server);

    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/logout")
        .header("authorization", "Bearer fake-token:alice")
        .reply(&app)
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    // Stateless tokens survive logout until natural expiry.
    let res = warp::test::request()
        .path("/api/v1/profile")
        .header("authorization", "Bearer fake-token:alice")
        .reply(&app)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_logs_require_admin_role() {
    let server = spawn_server().await;
    let app = app!(server);

    let res = warp::test::request()
        .path("/api/v1/admin/auth-logs")
        .header("authorization", "Bearer fake-token:alice")
        .reply(&app)
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = body_json(res.body());
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let res = warp::test::request()
        .path("/api/v1/admin/auth-logs")
        .header("authorization", "Bearer fake-token:admin")
        .reply(&app)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res.body());
    assert!(body["data"]["entries"].is_array());
}

#[tokio::test]
async fn auth_log_purge_needs_a_cutoff() {
    let server = spawn_server().await;
    let app = app!(server);

    let res = warp::test::request()
        .method("DELETE")
        .path("/api/v1/admin/auth-logs")
        .header("authorization", "Bearer fake-token:admin")
        .reply(&app)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = warp::test::request()
        .method("DELETE")
        .path("/api/v1/admin/auth-logs?before=2026-01-01T00:00:00Z")
        .header("authorization", "Bearer fake-token:admin")
        .reply(&app)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res.body());
    assert_eq!(body["data"]["deleted"], 0);
}

#[tokio::test]
async fn sixth_auth_attempt_is_rate_limited() {
    let server = spawn_server().await;
    let app = app!(server);

    for _ in 0..5 {
        let res = warp::test::request()
            .method("POST")
            .path("/api/v1/login")
            .json(&json!({"identifier": "alice", "password": "Str0ng!Pass"}))
            .reply(&app)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    // Correct credentials make no difference once the window is full.
    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/login")
        .json(&json!({"identifier": "alice", "password": "Str0ng!Pass"}))
        .reply(&app)
        .await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(res.body());
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let server = spawn_server().await;
    let app = app!(server);

    let res = warp::test::request()
        .path("/api/v1/nope")
        .reply(&app)
        .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
