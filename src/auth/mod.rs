//! Token issuance and verification.
//!
//! A [`TokenAuthority`] signs [`Claims`] for a [`Principal`] with the
//! deployment's HMAC secret and checks tokens presented on later requests.
//! It keeps no state beyond its keys: there is no revocation list and no
//! refresh, so expiry is the only way a token stops being valid.

mod authority;
mod claims;

pub use authority::{inspect_unverified, IssueError, TokenAuthority, VerifyError};
pub use claims::{Claims, Principal};
