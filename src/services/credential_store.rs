use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::Principal;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse credential file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("username is already taken: {0}")]
    DuplicateUsername(String),
    #[error("invalid credential record for '{username}': {reason}")]
    InvalidRecord { username: String, reason: &'static str },
    #[error("password hashing failed: {0}")]
    Hash(String),
}

impl From<bcrypt::BcryptError> for StoreError {
    fn from(err: bcrypt::BcryptError) -> Self {
        StoreError::Hash(err.to_string())
    }
}

/// A login-able account: the principal plus the bcrypt hash of its password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

impl CredentialRecord {
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            password_hash: password_hash.into(),
            role: role.into(),
        }
    }

    /// Constant-time bcrypt comparison. A corrupt hash never matches.
    pub fn matches_password(&self, password: &str) -> bool {
        match bcrypt::verify(password, &self.password_hash) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!(username = %self.username, "Unusable password hash: {}", e);
                false
            }
        }
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.id.clone(), self.role.clone())
    }

    fn validate(&self) -> Result<(), StoreError> {
        let invalid = |reason| StoreError::InvalidRecord {
            username: self.username.clone(),
            reason,
        };

        if self.username.trim().is_empty() {
            return Err(invalid("username is empty"));
        }
        if self.id.trim().is_empty() {
            return Err(invalid("id is empty"));
        }
        if self.role.trim().is_empty() {
            return Err(invalid("role is empty"));
        }
        if self.password_hash.len() != BCRYPT_HASH_LEN || !self.password_hash.starts_with("$2") {
            return Err(invalid("password_hash is not a bcrypt hash"));
        }
        Ok(())
    }
}

const BCRYPT_HASH_LEN: usize = 60;

/// bcrypt hash of `password` at work factor `cost`, as stored in credential files.
pub fn hash_password(password: &str, cost: u32) -> Result<String, StoreError> {
    Ok(bcrypt::hash(password, cost)?)
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError>;

    /// Insert a new account. Fails with `DuplicateUsername` if the name is taken.
    async fn create(&self, record: CredentialRecord) -> Result<CredentialRecord, StoreError>;
}

#[derive(Debug, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    users: Vec<CredentialRecord>,
}

/// In-memory store seeded from a YAML file:
///
/// ```yaml
/// users:
///   - id: "1"
///     username: admin
///     password_hash: "$2b$12$..."   # output of `tgctl password hash`
///     role: admin
/// ```
///
/// Accounts created at runtime live as long as the process and are not
/// written back to the file.
#[derive(Debug, Default)]
pub struct FileCredentialStore {
    records: RwLock<HashMap<String, CredentialRecord>>,
}

impl FileCredentialStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<CredentialRecord>) -> Result<Self, StoreError> {
        let mut by_username = HashMap::with_capacity(records.len());
        for record in records {
            record.validate()?;
            if by_username.contains_key(&record.username) {
                return Err(StoreError::DuplicateUsername(record.username));
            }
            by_username.insert(record.username.clone(), record);
        }
        Ok(Self {
            records: RwLock::new(by_username),
        })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, StoreError> {
        let file: CredentialFile = serde_yaml::from_str(yaml)?;
        Self::from_records(file.users)
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let contents = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_yaml_str(&contents)?;
        tracing::info!("Loaded {} credential(s) from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // The map is never left half-updated, so a poisoned lock is still usable
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CredentialRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CredentialRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.read().get(username).cloned())
    }

    async fn create(&self, record: CredentialRecord) -> Result<CredentialRecord, StoreError> {
        record.validate()?;

        let mut records = self.write();
        if records.contains_key(&record.username) {
            return Err(StoreError::DuplicateUsername(record.username));
        }
        records.insert(record.username.clone(), record.clone());
        Ok(record)
    }
}
