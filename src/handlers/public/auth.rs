// handlers/public/auth.rs - POST /api/v1/auth/login, POST /api/v1/auth/register

use axum::extract::{rejection::JsonRejection, Json, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{IssuedToken, RegisteredUser};

/// Body shared by login and register.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/v1/auth/login - Exchange credentials for a bearer token
///
/// Expected Input:
/// ```json
/// { "username": "admin", "password": "..." }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": { "token": "eyJhbGciOiJIUzI1NiI...", "token_type": "Bearer", "expires_in": 3600 }
/// }
/// ```
///
/// Unknown users and wrong passwords both answer 401 with the same body.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<IssuedToken> {
    let Json(payload) = payload?;
    let issued = state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    Ok(ApiResponse::success(issued))
}

/// POST /api/v1/auth/register - Create an account with the default role
///
/// Expected Output (201):
/// ```json
/// { "success": true, "data": { "id": "5b1f...", "username": "bob", "role": "user" } }
/// ```
///
/// Errors: 400 when a field is empty, 409 when the username is taken.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<RegisteredUser> {
    let Json(payload) = payload?;
    let user = state
        .auth_service
        .register(&payload.username, &payload.password)
        .await?;

    Ok(ApiResponse::with_status(user, StatusCode::CREATED))
}
