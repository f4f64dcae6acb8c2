//! Database module for authgate
//!
//! This module provides the identity model, the credential store boundary
//! and its PostgreSQL (SQLx) and in-memory implementations.

pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used items
pub use models::*;
pub use pool::{DbError, connect};
pub use repositories::{MemoryUserStore, PgUserStore, StoreError, UserStore};

// Re-export sqlx types that might be needed
pub use sqlx::PgPool;
