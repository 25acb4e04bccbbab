use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Startup-time configuration failures. The process refuses to start on any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("SECURITY_JWT_SECRET is missing or empty")]
    MissingSecret,

    #[error("signing algorithm '{0}' is not supported, expected one of HS256, HS384, HS512")]
    UnsupportedAlgorithm(String),

    #[error("issuer name must not be empty")]
    EmptyIssuer,

    #[error("invalid value '{value}' for {var}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_cors: bool,
    pub enable_request_logging: bool,
}

/// Token signing settings. Read once at startup and never mutated.
#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub jwt_issuer: String,
    pub jwt_expiry_secs: i64,
    /// bcrypt work factor for newly hashed passwords
    pub password_cost: u32,
    pub users_file: Option<PathBuf>,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_expiry_secs", &self.jwt_expiry_secs)
            .field("password_cost", &self.password_cost)
            .field("users_file", &self.users_file)
            .finish()
    }
}

impl SecurityConfig {
    /// HS256 settings with the default issuer and a one hour lifetime.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            jwt_algorithm: Algorithm::HS256,
            jwt_issuer: DEFAULT_ISSUER.to_string(),
            jwt_expiry_secs: 60 * 60,
            password_cost: bcrypt::DEFAULT_COST,
            users_file: None,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.jwt_issuer = issuer.into();
        self
    }

    pub fn with_expiry_secs(mut self, secs: i64) -> Self {
        self.jwt_expiry_secs = secs;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.jwt_algorithm = algorithm;
        self
    }

    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if !is_hmac(self.jwt_algorithm) {
            return Err(ConfigError::UnsupportedAlgorithm(format!("{:?}", self.jwt_algorithm)));
        }
        if self.jwt_issuer.trim().is_empty() {
            return Err(ConfigError::EmptyIssuer);
        }
        if !PASSWORD_COST_RANGE.contains(&self.password_cost) {
            return Err(ConfigError::InvalidValue {
                var: "SECURITY_BCRYPT_COST",
                value: self.password_cost.to_string(),
            });
        }
        Ok(())
    }
}

pub const DEFAULT_ISSUER: &str = "token-gate";

/// Work factors bcrypt accepts.
pub const PASSWORD_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(&lookup)?;

        config.security.validate()?;
        Ok(config)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // API overrides
        if let Some(v) = lookup("API_PORT") {
            self.api.port = parse_var("API_PORT", &v)?;
        } else if let Some(v) = lookup("PORT") {
            self.api.port = parse_var("PORT", &v)?;
        }
        if let Some(v) = lookup("API_ENABLE_CORS") {
            self.api.enable_cors = parse_var("API_ENABLE_CORS", &v)?;
        }
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = parse_var("API_ENABLE_REQUEST_LOGGING", &v)?;
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("SECURITY_JWT_ALGORITHM") {
            self.security.jwt_algorithm = Algorithm::from_str(v.trim())
                .map_err(|_| ConfigError::UnsupportedAlgorithm(v.clone()))?;
        }
        if let Some(v) = lookup("SECURITY_JWT_ISSUER") {
            self.security.jwt_issuer = v;
        }
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_SECS") {
            self.security.jwt_expiry_secs = parse_var("SECURITY_JWT_EXPIRY_SECS", &v)?;
        }
        if let Some(v) = lookup("SECURITY_BCRYPT_COST") {
            self.security.password_cost = parse_var("SECURITY_BCRYPT_COST", &v)?;
        }
        if let Some(v) = lookup("AUTH_USERS_FILE") {
            self.security.users_file = (!v.trim().is_empty()).then(|| PathBuf::from(v));
        }

        Ok(self)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                port: 3000,
                enable_cors: true,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_algorithm: Algorithm::HS256,
                jwt_issuer: DEFAULT_ISSUER.to_string(),
                jwt_expiry_secs: 24 * 60 * 60,
                password_cost: bcrypt::DEFAULT_COST,
                users_file: None,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                port: 3000,
                enable_cors: true,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_algorithm: Algorithm::HS256,
                jwt_issuer: DEFAULT_ISSUER.to_string(),
                jwt_expiry_secs: 4 * 60 * 60,
                password_cost: bcrypt::DEFAULT_COST,
                users_file: None,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                port: 3000,
                enable_cors: false,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_algorithm: Algorithm::HS256,
                jwt_issuer: DEFAULT_ISSUER.to_string(),
                jwt_expiry_secs: 60 * 60,
                password_cost: bcrypt::DEFAULT_COST,
                users_file: None,
            },
        }
    }
}

fn parse_var<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::from_lookup(lookup_from(&[("SECURITY_JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.security.jwt_algorithm, Algorithm::HS256);
        assert_eq!(config.security.jwt_expiry_secs, 24 * 60 * 60);
        assert!(config.security.users_file.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("APP_ENV", "production"),
            ("SECURITY_JWT_SECRET", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.api.enable_cors);
        assert_eq!(config.security.jwt_expiry_secs, 60 * 60);
    }

    #[test]
    fn test_missing_secret_refuses_to_start() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecret);

        let err = AppConfig::from_lookup(lookup_from(&[("SECURITY_JWT_SECRET", "")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecret);
    }

    #[test]
    fn test_whitespace_secret_refuses_to_start() {
        let err = AppConfig::from_lookup(lookup_from(&[("SECURITY_JWT_SECRET", "   ")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecret);

        let err = AppConfig::from_lookup(lookup_from(&[("SECURITY_JWT_SECRET", "\t\n")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecret);
    }

    #[test]
    fn test_invalid_port_names_the_variable_read() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("SECURITY_JWT_SECRET", "s3cret"),
            ("PORT", "http"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "PORT",
                value: "http".to_string()
            }
        );

        let err = AppConfig::from_lookup(lookup_from(&[
            ("SECURITY_JWT_SECRET", "s3cret"),
            ("API_PORT", "99999"),
            ("PORT", "8080"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "API_PORT", .. }));
    }

    #[test]
    fn test_password_cost() {
        let config = AppConfig::from_lookup(lookup_from(&[("SECURITY_JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.security.password_cost, bcrypt::DEFAULT_COST);

        let config = AppConfig::from_lookup(lookup_from(&[
            ("SECURITY_JWT_SECRET", "s3cret"),
            ("SECURITY_BCRYPT_COST", "6"),
        ]))
        .unwrap();
        assert_eq!(config.security.password_cost, 6);

        let err = AppConfig::from_lookup(lookup_from(&[
            ("SECURITY_JWT_SECRET", "s3cret"),
            ("SECURITY_BCRYPT_COST", "3"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "SECURITY_BCRYPT_COST", .. }));
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("SECURITY_JWT_SECRET", "s3cret"),
            ("SECURITY_JWT_ALGORITHM", "HS512"),
            ("SECURITY_JWT_ISSUER", "url-shortener"),
            ("SECURITY_JWT_EXPIRY_SECS", "900"),
            ("AUTH_USERS_FILE", "/etc/token-gate/users.yaml"),
            ("PORT", "8081"),
        ]))
        .unwrap();
        assert_eq!(config.api.port, 8081);
        assert_eq!(config.security.jwt_algorithm, Algorithm::HS512);
        assert_eq!(config.security.jwt_issuer, "url-shortener");
        assert_eq!(config.security.jwt_expiry_secs, 900);
        assert_eq!(
            config.security.users_file,
            Some(PathBuf::from("/etc/token-gate/users.yaml"))
        );
    }

    #[test]
    fn test_non_hmac_algorithm_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("SECURITY_JWT_SECRET", "s3cret"),
            ("SECURITY_JWT_ALGORITHM", "RS256"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedAlgorithm(_)));

        let err = AppConfig::from_lookup(lookup_from(&[
            ("SECURITY_JWT_SECRET", "s3cret"),
            ("SECURITY_JWT_ALGORITHM", "none"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("SECURITY_JWT_SECRET", "s3cret"),
            ("SECURITY_JWT_EXPIRY_SECS", "1h"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "SECURITY_JWT_EXPIRY_SECS",
                value: "1h".to_string()
            }
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let security = SecurityConfig::new("top-secret-value");
        let rendered = format!("{:?}", security);
        assert!(!rendered.contains("top-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
