pub mod auth;
pub mod response;

pub use auth::{extract_bearer, require_token, AccessGate, AuthUser, RoleSet};
pub use response::{ApiResponse, ApiResult};
