#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use token_gate::app::{app, AppState};
use token_gate::auth::{Principal, TokenAuthority};
use token_gate::config::{ApiConfig, SecurityConfig};
use token_gate::services::{hash_password, CredentialRecord, FileCredentialStore};

pub const SECRET: &str = "integration-test-secret";
pub const ISSUER: &str = "token-gate-it";
/// Cheapest bcrypt work factor, so the login tests stay fast.
pub const PASSWORD_COST: u32 = 4;

pub fn security() -> SecurityConfig {
    SecurityConfig::new(SECRET)
        .with_issuer(ISSUER)
        .with_expiry_secs(60 * 60)
        .with_password_cost(PASSWORD_COST)
}

pub fn authority() -> Arc<TokenAuthority> {
    Arc::new(TokenAuthority::new(&security()).expect("valid test security config"))
}

pub fn store() -> FileCredentialStore {
    FileCredentialStore::from_records(vec![
        account("1", "admin", "admin-password", "admin"),
        account("2", "alice", "alice-password", "user"),
    ])
    .expect("valid test credentials")
}

fn account(id: &str, username: &str, password: &str, role: &str) -> CredentialRecord {
    let hash = hash_password(password, PASSWORD_COST).expect("hashable test password");
    CredentialRecord::new(id, username, hash, role)
}

/// The full application router with logging and CORS layers off.
pub fn test_app() -> Router {
    let api = ApiConfig {
        port: 0,
        enable_cors: false,
        enable_request_logging: false,
    };
    app(AppState::new(authority(), Arc::new(store()), PASSWORD_COST), &api)
}

pub fn token_for(subject_id: &str, role: &str) -> String {
    authority()
        .issue(&Principal::new(subject_id, role))
        .expect("valid test principal")
}

pub fn get(path: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(path);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).expect("valid request")
}

pub fn post_json(path: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// Drive one request through `app` and decode the JSON body (Null if empty).
pub async fn send(app: Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    Ok((status, body))
}
