use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;

use crate::contract::model::{User, UserId};

/// Validated data for a row that does not exist yet; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserRecord {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub created_at: DateTime<Utc>,
}

/// Failures reported by the persistence port.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A unique index rejected the write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// An update matched no row.
    #[error("no user row with id {id}")]
    NotFound { id: UserId },

    #[error(transparent)]
    Store(#[from] DbErr),
}

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Load a user by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepoError>;
    /// All users ordered by id.
    async fn find_all(&self) -> Result<Vec<User>, RepoError>;
    /// Exact-match lookup by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    /// Insert a validated record and return the stored user with its new id.
    async fn insert(&self, record: NewUserRecord) -> Result<User, RepoError>;
    /// Overwrite the mutable columns of an existing user (by primary key in `user.id`).
    async fn update(&self, user: User) -> Result<User, RepoError>;
    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, id: UserId) -> Result<bool, RepoError>;
}
