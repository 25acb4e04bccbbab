// handlers/protected/admin.rs - GET /api/v1/admin/ping

use axum::Extension;
use serde::Serialize;

use crate::middleware::{ApiResponse, AuthUser};

#[derive(Debug, Serialize)]
pub struct AdminPing {
    pub pong: bool,
    pub subject_id: String,
}

pub async fn admin_ping(Extension(user): Extension<AuthUser>) -> ApiResponse<AdminPing> {
    ApiResponse::success(AdminPing {
        pong: true,
        subject_id: user.subject_id,
    })
}
