use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::TokenAuthority;
use crate::config::ApiConfig;
use crate::handlers::{self, protected, public};
use crate::middleware::{AccessGate, RoleSet};
use crate::services::{AuthService, CredentialStore};

/// Shared, read-only dependencies handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub authority: Arc<TokenAuthority>,
    pub auth_service: AuthService,
}

impl AppState {
    pub fn new(authority: Arc<TokenAuthority>, store: Arc<dyn CredentialStore>, password_cost: u32) -> Self {
        Self {
            auth_service: AuthService::new(store, authority.clone(), password_cost),
            authority,
        }
    }

    /// A gate backed by this state's token authority.
    pub fn gate(&self, roles: RoleSet) -> AccessGate {
        AccessGate::new(self.authority.clone(), roles)
    }
}

pub fn app(state: AppState, api: &ApiConfig) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(public_routes())
        // Protected, one gate per allow-list
        .merge(state.gate(RoleSet::any()).protect(session_routes()))
        .merge(state.gate(RoleSet::from(["admin", "user"])).protect(report_routes()))
        .merge(state.gate(RoleSet::from(["admin"])).protect(admin_routes()))
        .fallback(handlers::not_found)
        .with_state(state);

    let router = if api.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    if api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/login", post(public::login))
        .route("/api/v1/auth/register", post(public::register))
}

fn session_routes() -> Router<AppState> {
    Router::new().route("/api/v1/auth/whoami", get(protected::whoami))
}

fn report_routes() -> Router<AppState> {
    Router::new().route("/api/v1/reports", get(protected::list_reports))
}

fn admin_routes() -> Router<AppState> {
    Router::new().route("/api/v1/admin/ping", get(protected::admin_ping))
}
