//! Credential store for authgate
//!
//! This module defines the `UserStore` boundary the auth flows consume and
//! its two implementations: PostgreSQL (via SQLx) and an in-process map.

pub mod memory;
pub mod user;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::db::models::{CreateUser, User};

pub use memory::MemoryUserStore;
pub use user::PgUserStore;

/// Credential store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User not found")]
    NotFound,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateEmail
            }
            sqlx::Error::RowNotFound => StoreError::NotFound,
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Lookup and mutation of identities, keyed by id and by email.
///
/// `create` must be atomic: when two callers race on the same email exactly
/// one succeeds and the other gets `StoreError::DuplicateEmail`.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by email (exact match)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Create a user from an already-hashed password
    async fn create(&self, user: CreateUser) -> Result<User, StoreError>;

    /// Replace a user's password hash
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;

    /// Delete a user by ID. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}
