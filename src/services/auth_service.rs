use std::sync::Arc;

use serde::Serialize;

use super::credential_store::{hash_password, CredentialRecord, CredentialStore, StoreError};
use crate::auth::{IssueError, TokenAuthority};

/// Role given to self-registered accounts.
pub const DEFAULT_ROLE: &str = "user";

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Issue(#[from] IssueError),
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("username is already taken")]
    UsernameTaken,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RegisterError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(_) => RegisterError::UsernameTaken,
            other => RegisterError::Store(other),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredUser {
    pub id: String,
    pub username: String,
    pub role: String,
}

/// Account registration and username/password login.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    authority: Arc<TokenAuthority>,
    password_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, authority: Arc<TokenAuthority>, password_cost: u32) -> Self {
        Self {
            store,
            authority,
            password_cost,
        }
    }

    /// Create an account with the default role. Passwords are stored as bcrypt hashes.
    pub async fn register(&self, username: &str, password: &str) -> Result<RegisteredUser, RegisterError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(RegisterError::MissingCredentials);
        }

        if self.store.find_by_username(username).await?.is_some() {
            tracing::info!(username, "Registration rejected: username taken");
            return Err(RegisterError::UsernameTaken);
        }

        let password_hash = hash_blocking(password.to_owned(), self.password_cost).await?;
        let record = CredentialRecord::new(uuid::Uuid::new_v4().to_string(), username, password_hash, DEFAULT_ROLE);

        // create() is the authority on uniqueness if two registrations race
        let created = self.store.create(record).await.map_err(|e| {
            if matches!(e, StoreError::DuplicateUsername(_)) {
                tracing::info!(username, "Registration rejected: username taken");
            }
            RegisterError::from(e)
        })?;
        tracing::info!(username, id = %created.id, role = %created.role, "Registered account");

        Ok(RegisteredUser {
            id: created.id,
            username: created.username,
            role: created.role,
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, LoginError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }

        // Unknown user and wrong password look the same to the caller
        let Some(record) = self.store.find_by_username(username).await? else {
            tracing::info!(username, "Login rejected: unknown user");
            return Err(LoginError::InvalidCredentials);
        };
        let (record, matched) = verify_blocking(record, password.to_owned()).await?;
        if !matched {
            tracing::info!(username, "Login rejected: wrong password");
            return Err(LoginError::InvalidCredentials);
        }

        let token = self.authority.issue(&record.principal())?;
        tracing::info!(username, role = %record.role, "Issued token");

        Ok(IssuedToken {
            token,
            token_type: "Bearer",
            expires_in: self.authority.lifetime().num_seconds(),
        })
    }
}

// bcrypt is deliberately slow; keep it off the async worker threads
async fn hash_blocking(password: String, cost: u32) -> Result<String, StoreError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| StoreError::Hash(e.to_string()))?
}

async fn verify_blocking(record: CredentialRecord, password: String) -> Result<(CredentialRecord, bool), StoreError> {
    tokio::task::spawn_blocking(move || {
        let matched = record.matches_password(&password);
        (record, matched)
    })
    .await
    .map_err(|e| StoreError::Hash(e.to_string()))
}
