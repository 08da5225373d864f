use async_trait::async_trait;

use crate::contract::{
    error::UsersError,
    model::{NewUser, User, UserId, UserPatch},
};

/// Public API of the users module for in-process consumers (console, other modules)
#[async_trait]
pub trait UsersApi: Send + Sync {
    /// Get a user by ID; `None` when absent
    async fn get_user(&self, id: UserId) -> Result<Option<User>, UsersError>;

    /// List all users
    async fn list_users(&self) -> Result<Vec<User>, UsersError>;

    /// Create a new user
    async fn create_user(&self, new_user: NewUser) -> Result<User, UsersError>;

    /// Update a user with partial data
    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, UsersError>;

    /// Delete a user by ID; `false` when there was nothing to delete
    async fn delete_user(&self, id: UserId) -> Result<bool, UsersError>;
}
