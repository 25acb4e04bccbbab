use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::{from_fn_with_state, Next},
    response::Response,
    Router,
};
use serde::Serialize;

use crate::auth::{Claims, TokenAuthority};
use crate::error::{ApiError, AuthError, AuthenticationFailure};

const BEARER_PREFIX: &str = "Bearer ";

/// Authenticated principal attached to the request by the access gate
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub subject_id: String,
    pub role: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.subject_id,
            role: claims.role,
        }
    }
}

/// Roles allowed through a gate. Empty means any authenticated principal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn of<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact, case-sensitive membership. An empty role is never permitted.
    pub fn permits(&self, role: &str) -> bool {
        if role.is_empty() {
            return false;
        }
        self.0.is_empty() || self.0.contains(role)
    }
}

impl<const N: usize> From<[&str; N]> for RoleSet {
    fn from(roles: [&str; N]) -> Self {
        Self::of(roles)
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<any>");
        }
        let roles: Vec<&str> = self.0.iter().map(String::as_str).collect();
        write!(f, "{}", roles.join(","))
    }
}

/// Per-route guard: bearer extraction, token verification, then role check.
#[derive(Clone, Debug)]
pub struct AccessGate {
    authority: Arc<TokenAuthority>,
    allowed: Arc<RoleSet>,
}

impl AccessGate {
    pub fn new(authority: Arc<TokenAuthority>, allowed: RoleSet) -> Self {
        Self {
            authority,
            allowed: Arc::new(allowed),
        }
    }

    pub fn allowed_roles(&self) -> &RoleSet {
        &self.allowed
    }

    /// Run the three gate stages against a raw `Authorization` header value.
    /// Each stage only runs if the previous one succeeded.
    pub fn authorize(&self, authorization: Option<&str>) -> Result<AuthUser, AuthError> {
        let token = extract_bearer(authorization)?;
        let claims = self.authority.verify(token)?;
        self.authorize_role(claims)
    }

    fn authorize_role(&self, claims: Claims) -> Result<AuthUser, AuthError> {
        if !self.allowed.permits(&claims.role) {
            return Err(AuthError::Authorization { role: claims.role });
        }
        Ok(AuthUser::from(claims))
    }

    /// Put every route currently in `router` behind this gate.
    pub fn protect<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(from_fn_with_state(self, require_token))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(authorization: Option<&str>) -> Result<&str, AuthenticationFailure> {
    let value = authorization.ok_or(AuthenticationFailure::MissingHeader)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthenticationFailure::InvalidScheme)?;

    if token.trim().is_empty() {
        return Err(AuthenticationFailure::EmptyToken);
    }
    Ok(token)
}

/// Access gate middleware. On success the verified [`AuthUser`] is inserted
/// into the request extensions for downstream handlers.
pub async fn require_token(
    State(gate): State<AccessGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let outcome = match request.headers().get(AUTHORIZATION) {
        None => gate.authorize(None),
        Some(value) => match value.to_str() {
            Ok(value) => gate.authorize(Some(value)),
            Err(_) => Err(AuthenticationFailure::InvalidHeaderEncoding.into()),
        },
    };

    let auth_user = match outcome {
        Ok(user) => user,
        Err(err) => {
            log_rejection(&err, request.uri().path(), &gate);
            return Err(err.into());
        }
    };

    tracing::debug!(
        subject_id = %auth_user.subject_id,
        role = %auth_user.role,
        "Request authorized"
    );

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

fn log_rejection(err: &AuthError, path: &str, gate: &AccessGate) {
    match err {
        AuthError::Authentication(AuthenticationFailure::MissingHeader) => {
            tracing::debug!(path, "Rejected request without Authorization header");
        }
        AuthError::Authentication(reason) => {
            tracing::warn!(path, %reason, "Rejected unauthenticated request");
        }
        AuthError::Authorization { role } => {
            tracing::warn!(path, role = %role, allowed = %gate.allowed_roles(), "Rejected request for role");
        }
        AuthError::Configuration(e) => {
            tracing::error!(path, error = %e, "Access gate misconfigured");
        }
    }
}
