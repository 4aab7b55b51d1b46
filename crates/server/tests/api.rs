//! Integration tests for the rounds driver protocol.

use std::sync::Arc;
use std::time::Duration;

use axum_test::{TestResponse, TestServer};
use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use rounds_core::driver::protocol::{PageResponse, StateResponse, SESSION_HEADER};
use rounds_core::{Locator, Page};
use rounds_server::{build_router, AppState, ServerConfig};
use serde_json::json;

fn test_server() -> TestServer {
    let state = Arc::new(AppState::new(ServerConfig::default()).unwrap());
    let app = build_router(state);
    TestServer::new(app).unwrap()
}

fn session_of(res: &TestResponse) -> String {
    res.header(SESSION_HEADER).to_str().unwrap().to_string()
}

fn session_header() -> HeaderName {
    HeaderName::from_bytes(SESSION_HEADER.as_bytes()).unwrap()
}

fn token_value(token: &str) -> HeaderValue {
    HeaderValue::from_str(token).unwrap()
}

/// Load the patient fixture and sign in, returning the session token.
async fn signed_in(server: &TestServer) -> String {
    let res = server
        .post("/api/fixture")
        .json(&json!({ "name": "patient" }))
        .await;
    res.assert_status_ok();
    let token = session_of(&res);

    server
        .post("/api/authenticate")
        .add_header(session_header(), token_value(&token))
        .json(&json!({ "username": "hradmin" }))
        .await
        .assert_status_ok();
    token
}

#[tokio::test]
async fn health_returns_ok() {
    let server = test_server();
    let res = server.get("/health").await;
    res.assert_status_ok();
    res.assert_text("ok");
}

#[tokio::test]
async fn first_request_creates_a_session() {
    let server = test_server();
    let res = server.get("/api/url").await;
    res.assert_status_ok();
    assert!(!session_of(&res).is_empty());

    let state: StateResponse = res.json();
    assert_eq!(state.url, "/");
    assert_eq!(state.elapsed_ms, 0);
}

#[tokio::test]
async fn unknown_token_gets_a_fresh_session() {
    let server = test_server();
    let res = server
        .get("/api/url")
        .add_header(session_header(), token_value("no-such-session"))
        .await;
    res.assert_status_ok();
    assert_ne!(session_of(&res), "no-such-session");
}

#[tokio::test]
async fn idle_sessions_are_purged() {
    let config = ServerConfig {
        session_timeout: Duration::from_millis(50),
        ..ServerConfig::default()
    };
    let state = Arc::new(AppState::new(config).unwrap());
    let server = TestServer::new(build_router(state.clone())).unwrap();

    let first = session_of(&server.get("/api/url").await);
    let second = session_of(&server.get("/api/url").await);
    assert_eq!(state.session_count(), 2);

    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = server
        .get("/api/url")
        .add_header(session_header(), token_value(&first))
        .await;
    res.assert_status_ok();
    let fresh = session_of(&res);
    assert_ne!(fresh, first);
    assert_ne!(fresh, second);
    // Both idle sessions went; only the new one is left.
    assert_eq!(state.session_count(), 1);
}

#[tokio::test]
async fn unknown_fixture_returns_400() {
    let server = test_server();
    let res = server
        .post("/api/fixture")
        .json(&json!({ "name": "ward-7" }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json();
    assert_eq!(body["error"], "unknown fixture: ward-7");
}

#[tokio::test]
async fn fixture_missing_name_returns_422() {
    let server = test_server();
    let res = server.post("/api/fixture").json(&json!({})).await;
    res.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn empty_username_returns_400() {
    let server = test_server();
    let res = server
        .post("/api/authenticate")
        .json(&json!({ "username": "  " }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn visit_without_sign_in_redirects_to_login() {
    let server = test_server();
    let res = server.post("/api/fixture").json(&json!({ "name": "patient" })).await;
    let token = session_of(&res);

    server
        .post("/api/visit")
        .add_header(session_header(), token_value(&token))
        .json(&json!({ "route": "/patients" }))
        .await
        .assert_status_ok();
    let res = server
        .post("/api/settle")
        .add_header(session_header(), token_value(&token))
        .json(&json!({}))
        .await;
    let state: StateResponse = res.json();
    assert_eq!(state.url, "/login");
}

#[tokio::test]
async fn session_keeps_state_between_requests() {
    let server = test_server();
    let token = signed_in(&server).await;

    server
        .post("/api/visit")
        .add_header(session_header(), token_value(&token))
        .json(&json!({ "route": "/patients" }))
        .await
        .assert_status_ok();
    let res = server
        .post("/api/settle")
        .add_header(session_header(), token_value(&token))
        .json(&json!({}))
        .await;
    res.assert_status_ok();
    assert_eq!(session_of(&res), token);

    let res = server
        .get("/api/page")
        .add_header(session_header(), token_value(&token))
        .await;
    res.assert_status_ok();
    let page: PageResponse = res.json();
    assert_eq!(page.url, "/patients");
    assert!(page.html.contains("Joe Bagadonuts"));
}

#[tokio::test]
async fn click_follows_the_element_handle() {
    let server = test_server();
    let token = signed_in(&server).await;

    server
        .post("/api/visit")
        .add_header(session_header(), token_value(&token))
        .json(&json!({ "route": "/patients" }))
        .await;
    server
        .post("/api/settle")
        .add_header(session_header(), token_value(&token))
        .json(&json!({}))
        .await;

    let page: PageResponse = server
        .get("/api/page")
        .add_header(session_header(), token_value(&token))
        .await
        .json();
    let page = Page::parse(&page.url, &page.html).unwrap();
    let locator = Locator::css(".patient-list button:contains(Edit)").unwrap();
    let target = page.handle(page.find_one(&locator).unwrap());

    server
        .post("/api/click")
        .add_header(session_header(), token_value(&token))
        .json(&json!({ "target": target }))
        .await
        .assert_status_ok();
    let res = server
        .post("/api/settle")
        .add_header(session_header(), token_value(&token))
        .json(&json!({}))
        .await;
    let state: StateResponse = res.json();
    assert!(state.url.starts_with("/patients/edit/"));
}

#[tokio::test]
async fn stale_handle_returns_400() {
    let server = test_server();
    let token = signed_in(&server).await;

    let res = server
        .post("/api/fill")
        .add_header(session_header(), token_value(&token))
        .json(&json!({
            "target": { "path": [9, 9, 9], "tag": "input", "label": "input.ghost" },
            "text": "hello"
        }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json();
    assert_eq!(
        body["error"],
        "action rejected: input.ghost is no longer on the page"
    );
}

#[tokio::test]
async fn advance_moves_the_session_clock() {
    let server = test_server();
    let res = server.post("/api/advance").json(&json!({ "ms": 250 })).await;
    res.assert_status_ok();
    let token = session_of(&res);
    let state: StateResponse = res.json();
    assert_eq!(state.elapsed_ms, 250);

    let res = server
        .get("/api/url")
        .add_header(session_header(), token_value(&token))
        .await;
    let state: StateResponse = res.json();
    assert_eq!(state.elapsed_ms, 250);
}
