// handlers/public/mod.rs - Public handlers (no token required)
//
// Token acquisition lives here: a client registers or logs in once and
// presents the returned bearer token on every protected request until it
// expires.

pub mod auth;

pub use auth::{login, register};
