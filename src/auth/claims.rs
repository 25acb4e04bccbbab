use serde::{Deserialize, Serialize};

/// The authenticated identity a token represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject_id: String,
    pub role: String,
}

impl Principal {
    pub fn new(subject_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            role: role.into(),
        }
    }
}

/// JWT payload. Field names on the wire follow the registered claim names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "sub")]
    pub subject_id: String,
    pub role: String,
    #[serde(rename = "iss")]
    pub issuer: String,
    /// Issued-at (seconds since epoch)
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Expiry (seconds since epoch)
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl Claims {
    pub fn principal(&self) -> Principal {
        Principal::new(self.subject_id.clone(), self.role.clone())
    }

    /// Seconds left before expiry at `now`, zero once expired.
    pub fn remaining_secs(&self, now: i64) -> i64 {
        (self.expires_at - now).max(0)
    }
}
