// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Each group below is mounted behind its own access gate in `app`, with the
// allow-list noted next to it.

pub mod admin;   // {"admin"}
pub mod auth;    // any authenticated role
pub mod reports; // {"admin", "user"}

pub use admin::admin_ping;
pub use auth::whoami;
pub use reports::list_reports;
