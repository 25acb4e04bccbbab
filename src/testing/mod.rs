//! Unit-test helpers shared across modules.

use crate::auth::{Principal, TokenAuthority};
use crate::config::SecurityConfig;

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_only";
pub const TEST_ISSUER: &str = "token-gate-test";
/// Lowest cost bcrypt accepts, so hashing in tests stays fast.
pub const TEST_PASSWORD_COST: u32 = 4;

/// HS256, one hour lifetime, test issuer.
pub fn security_config(secret: &str) -> SecurityConfig {
    SecurityConfig::new(secret)
        .with_issuer(TEST_ISSUER)
        .with_expiry_secs(60 * 60)
        .with_password_cost(TEST_PASSWORD_COST)
}

pub fn authority() -> TokenAuthority {
    TokenAuthority::new(&security_config(TEST_SECRET)).expect("test security config is valid")
}

/// A ready-made `Authorization` header value for `principal`.
pub fn bearer(principal: &Principal) -> String {
    let token = authority().issue(principal).expect("test principal is valid");
    format!("Bearer {}", token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header_verifies() {
        let header = bearer(&Principal::new("1", "admin"));
        let token = header.strip_prefix("Bearer ").unwrap();
        let claims = authority().verify(token).unwrap();
        assert_eq!(claims.issuer, TEST_ISSUER);
    }
}
