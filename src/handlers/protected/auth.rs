// handlers/protected/auth.rs - GET /api/v1/auth/whoami

use axum::Extension;

use crate::middleware::{ApiResponse, AuthUser};

/// GET /api/v1/auth/whoami - The principal carried by the presented token
///
/// Reads the principal the access gate attached to the request; the token is
/// not verified a second time.
pub async fn whoami(Extension(user): Extension<AuthUser>) -> ApiResponse<AuthUser> {
    ApiResponse::success(user)
}
