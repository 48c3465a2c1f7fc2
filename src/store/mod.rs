//! Repository interfaces consumed by the workflows.
//!
//! Lookups return `Result<Option<T>, StoreError>`: `Ok(Some(_))` is found,
//! `Ok(None)` is not found and `Err(_)` is a storage failure. Workflows never see
//! engine-specific error values. Soft-deleted rows are invisible to every lookup.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::models::{NewUser, Task, User};

pub use memory::{MemoryTaskRepository, MemoryUserRepository};
pub use postgres::{PgTaskRepository, PgUserRepository};

/// Failure reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    UniqueViolation(String),
    /// Any other backend failure (connection, timeout, query).
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::UniqueViolation(msg) => write!(f, "unique violation: {}", msg),
            StoreError::Backend(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.is_unique_violation() {
                return StoreError::UniqueViolation(db_error.message().to_string());
            }
        }
        StoreError::Backend(error.to_string())
    }
}

/// The user directory.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persists a new user and returns it with its assigned id.
    async fn save(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;
    /// Writes name and email. The password hash is left alone.
    async fn update(&self, user: &User) -> Result<(), StoreError>;
    /// Soft delete.
    async fn delete(&self, id: i32) -> Result<(), StoreError>;
}

/// The task store.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn save(&self, task: &Task) -> Result<Task, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError>;
    /// All live tasks of `owner`, newest first.
    async fn find_by_owner(&self, owner: i32) -> Result<Vec<Task>, StoreError>;
    async fn find_by_id_and_owner(&self, id: Uuid, owner: i32)
        -> Result<Option<Task>, StoreError>;
    /// Writes title, description, due date and status. The owner is immutable.
    async fn update(&self, task: &Task) -> Result<(), StoreError>;
    /// Soft delete.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
    /// Sets `overdue` on every live task of `owner` that is past due at `now` and
    /// neither completed nor already overdue. Returns the number of tasks changed.
    async fn mark_overdue_bulk(&self, owner: i32, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
