#![allow(dead_code)]

use axum_test::TestServer;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use std::sync::Arc;
use trimlink::application::services::LinkSettings;
use trimlink::application::services::auth_service::Claims;
use trimlink::infrastructure::persistence::MemoryLinkRepository;
use trimlink::routes::{RateLimiting, router};
use trimlink::state::AppState;

pub const JWT_SECRET: &str = "test-secret";

pub fn create_test_state() -> AppState {
    AppState::new(
        Arc::new(MemoryLinkRepository::new()),
        LinkSettings::default(),
        JWT_SECRET,
    )
}

pub fn create_test_server() -> TestServer {
    let app = router(create_test_state(), RateLimiting::Disabled);
    TestServer::new(app).unwrap()
}

/// Mints an HS256 token for `sub`, valid for an hour.
pub fn token(sub: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn bearer(sub: &str) -> String {
    format!("Bearer {}", token(sub))
}

/// Creates a link as `owner` (anonymous when `None`) and returns the `data` object.
pub async fn create_link(server: &TestServer, owner: Option<&str>, body: Value) -> Value {
    let mut request = server.post("/api/links").json(&body);
    if let Some(owner) = owner {
        request = request.add_header("Authorization", bearer(owner));
    }
    let response = request.await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

pub async fn create_simple_link(server: &TestServer, owner: Option<&str>) -> String {
    let data = create_link(server, owner, json!({ "originalUrl": "https://example.com" })).await;
    data["shortCode"].as_str().unwrap().to_string()
}
