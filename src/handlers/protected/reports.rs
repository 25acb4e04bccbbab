// handlers/protected/reports.rs - GET /api/v1/reports

use axum::Extension;
use serde::Serialize;

use crate::middleware::{ApiResponse, AuthUser};

#[derive(Debug, Serialize)]
pub struct ReportList {
    pub requested_by: String,
    pub role: String,
    pub reports: Vec<String>,
}

/// Placeholder business endpoint shared by admins and regular users.
pub async fn list_reports(Extension(user): Extension<AuthUser>) -> ApiResponse<ReportList> {
    ApiResponse::success(ReportList {
        requested_by: user.subject_id,
        role: user.role,
        reports: Vec::new(),
    })
}
