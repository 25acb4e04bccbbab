pub mod auth_service;
pub mod credential_store;

pub use auth_service::{AuthService, IssuedToken, LoginError, RegisterError, RegisteredUser, DEFAULT_ROLE};
pub use credential_store::{
    hash_password, CredentialRecord, CredentialStore, FileCredentialStore, StoreError,
};
