// handlers/mod.rs - Two security tiers
//
// Public (no auth) → Protected (bearer token + role allow-list per route group)
//
// The access gate runs as a route layer in front of every protected handler,
// so handlers here only ever see requests that already passed it and read the
// principal from `Extension<AuthUser>`.
pub mod public;
pub mod protected;

use axum::response::Json;
use serde_json::{json, Value};

use crate::error::ApiError;

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "token-gate",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "login": "POST /api/v1/auth/login (public)",
                "register": "POST /api/v1/auth/register (public)",
                "whoami": "GET /api/v1/auth/whoami (any authenticated role)",
                "reports": "GET /api/v1/reports (admin, user)",
                "admin": "GET /api/v1/admin/ping (admin)",
                "health": "GET /health (public)"
            }
        }
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now()
        }
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
