use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use super::claims::{Claims, Principal};
use crate::config::{ConfigError, SecurityConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueError {
    #[error("principal subject id must not be empty")]
    EmptySubject,

    #[error("principal role must not be empty")]
    EmptyRole,

    #[error("token expiry is out of range")]
    ExpiryOutOfRange,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Why a presented token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token was issued by a different authority")]
    WrongIssuer,

    #[error("token has expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => VerifyError::InvalidSignature,
            ErrorKind::InvalidIssuer => VerifyError::WrongIssuer,
            ErrorKind::ExpiredSignature => VerifyError::Expired,
            _ => VerifyError::Malformed,
        }
    }
}

/// Issues and verifies HMAC-signed JWTs for a single deployment.
///
/// Holds only read-only key material, so one instance is shared (behind an
/// `Arc`) by every request handler.
pub struct TokenAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: String,
    lifetime: Duration,
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenAuthority {
    pub fn new(security: &SecurityConfig) -> Result<Self, ConfigError> {
        security.validate()?;

        let lifetime = Duration::try_seconds(security.jwt_expiry_secs).ok_or_else(|| {
            ConfigError::InvalidValue {
                var: "SECURITY_JWT_EXPIRY_SECS",
                value: security.jwt_expiry_secs.to_string(),
            }
        })?;

        let secret = security.jwt_secret.as_bytes();
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: security.jwt_algorithm,
            issuer: security.jwt_issuer.clone(),
            lifetime,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn issue(&self, principal: &Principal) -> Result<String, IssueError> {
        self.issue_at(principal, Utc::now())
    }

    /// Sign a token for `principal` as if the current time were `now`.
    pub fn issue_at(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, IssueError> {
        self.claims_at(principal, now)
            .and_then(|claims| self.sign(&claims))
    }

    /// Build the claims a token issued at `now` would carry.
    pub fn claims_at(&self, principal: &Principal, now: DateTime<Utc>) -> Result<Claims, IssueError> {
        if principal.subject_id.trim().is_empty() {
            return Err(IssueError::EmptySubject);
        }
        if principal.role.trim().is_empty() {
            return Err(IssueError::EmptyRole);
        }

        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or(IssueError::ExpiryOutOfRange)?;

        Ok(Claims {
            subject_id: principal.subject_id.clone(),
            role: principal.role.clone(),
            issuer: self.issuer.clone(),
            issued_at: now.timestamp(),
            expires_at: expires_at.timestamp(),
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, IssueError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| IssueError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        self.verify_at(token, Utc::now())
    }

    /// Check structure, signature and issuer, then expiry against `now`.
    ///
    /// Expiry is checked here rather than by `jsonwebtoken` so the clock can be
    /// injected and no leeway applies: a token is valid strictly before `exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, VerifyError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation())?.claims;

        if now.timestamp() >= claims.expires_at {
            return Err(VerifyError::Expired);
        }

        Ok(claims)
    }

    fn validation(&self) -> Validation {
        // Pin the algorithm so a token can't pick its own verification scheme
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation
    }
}

/// Decode a token's claims without checking signature, issuer or expiry.
///
/// Diagnostics only. Never use the result to make an access decision.
pub fn inspect_unverified(token: &str) -> Result<(Header, Claims), VerifyError> {
    let header = jsonwebtoken::decode_header(token)?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.set_required_spec_claims::<&str>(&[]);

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok((header, data.claims))
}
