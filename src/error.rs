// Error taxonomy and HTTP mapping
use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::{IssueError, VerifyError};
use crate::config::ConfigError;
use crate::services::{LoginError, RegisterError, StoreError};

/// Reasons a request failed authentication. Only ever logged; clients see a
/// uniform 401 regardless of the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthenticationFailure {
    #[error("missing Authorization header")]
    MissingHeader,

    #[error("Authorization header is not valid UTF-8")]
    InvalidHeaderEncoding,

    #[error("Authorization header must use the Bearer scheme")]
    InvalidScheme,

    #[error("empty bearer token")]
    EmptyToken,

    #[error(transparent)]
    Token(#[from] VerifyError),
}

/// Outcome classes of the access gate, plus the startup-time configuration class.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthenticationFailure),

    #[error("role '{role}' is not permitted for this operation")]
    Authorization { role: String },
}

impl From<VerifyError> for AuthError {
    fn from(err: VerifyError) -> Self {
        AuthError::Authentication(AuthenticationFailure::Token(err))
    }
}

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": {
                "code": self.error_code(),
                "message": self.message()
            }
        })
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

// Gate outcomes never carry the specific failure reason to the client
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Configuration(e) => {
                tracing::error!("Authentication misconfigured: {}", e);
                ApiError::internal_server_error("Authentication is unavailable")
            }
            AuthError::Authentication(_) => ApiError::unauthorized("Authentication required"),
            AuthError::Authorization { .. } => {
                ApiError::forbidden("You do not have permission to perform this operation")
            }
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::MissingCredentials => ApiError::bad_request("Username and password are required"),
            LoginError::InvalidCredentials => ApiError::unauthorized("Invalid username or password"),
            LoginError::Store(e) => ApiError::from(e),
            LoginError::Issue(e) => ApiError::from(e),
        }
    }
}

impl From<RegisterError> for ApiError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::MissingCredentials => ApiError::bad_request("Username and password are required"),
            RegisterError::UsernameTaken => ApiError::conflict("Username is already taken"),
            RegisterError::Store(e) => ApiError::from(e),
        }
    }
}

// Malformed or missing JSON bodies get the same envelope as every other error
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        ApiError::bad_request(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Credential store error: {}", err);
        ApiError::internal_server_error("An error occurred while processing your request")
    }
}

impl From<IssueError> for ApiError {
    fn from(err: IssueError) -> Self {
        tracing::error!("Token issuance failed: {}", err);
        ApiError::internal_server_error("Failed to issue token")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
