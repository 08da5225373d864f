use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use tracing::{debug, error, info, instrument};

use crate::contract::model::{NewUser, User, UserId, UserPatch};
use crate::domain::error::DomainError;
use crate::domain::repo::{NewUserRecord, RepoError, UsersRepository};

/// Domain service with business rules for user management.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_name_length: usize,
    pub max_email_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_name_length: 100,
            max_email_length: 254,
        }
    }
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(repo: Arc<dyn UsersRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    #[instrument(name = "users.service.get_user", skip(self), fields(user_id = id))]
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, DomainError> {
        debug!("Getting user by id");
        let user = self.repo.find_by_id(id).await.map_err(store_failure)?;
        debug!(found = user.is_some(), "User lookup finished");
        Ok(user)
    }

    #[instrument(name = "users.service.list_users", skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        debug!("Listing users");
        let users = self.repo.find_all().await.map_err(store_failure)?;
        debug!("Successfully listed {} users", users.len());
        Ok(users)
    }

    #[instrument(
        name = "users.service.create_user",
        skip(self, new_user),
        fields(email = %new_user.email)
    )]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");

        let record = self.validate_new_user(new_user)?;

        if self
            .repo
            .find_by_email(&record.email)
            .await
            .map_err(store_failure)?
            .is_some()
        {
            return Err(DomainError::email_already_exists(record.email));
        }

        let email = record.email.clone();
        let user = self.repo.insert(record).await.map_err(|e| match e {
            RepoError::ConstraintViolation(_) => DomainError::email_already_exists(email),
            other => store_failure(other),
        })?;

        info!("Successfully created user with id={}", user.id);
        Ok(user)
    }

    #[instrument(name = "users.service.update_user", skip(self, patch), fields(user_id = id))]
    pub async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, DomainError> {
        info!("Updating user");

        let patch = self.validate_user_patch(patch)?;

        let current = self
            .repo
            .find_by_id(id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        // Uniqueness for email change
        if let Some(ref new_email) = patch.email {
            if new_email != &current.email {
                if let Some(owner) = self
                    .repo
                    .find_by_email(new_email)
                    .await
                    .map_err(store_failure)?
                {
                    if owner.id != id {
                        return Err(DomainError::email_already_exists(new_email.clone()));
                    }
                }
            }
        }

        let mut updated = current.clone();
        if let Some(name) = patch.name {
            updated.name = name;
        }
        if let Some(email) = patch.email {
            updated.email = email;
        }
        if let Some(age) = patch.age {
            updated.age = age;
        }

        if updated == current {
            debug!("Patch changes nothing; skipping write");
            return Ok(current);
        }

        let email = updated.email.clone();
        let stored = self.repo.update(updated).await.map_err(|e| match e {
            RepoError::ConstraintViolation(_) => DomainError::email_already_exists(email),
            RepoError::NotFound { id } => DomainError::user_not_found(id),
            other => store_failure(other),
        })?;

        info!("Successfully updated user");
        Ok(stored)
    }

    #[instrument(name = "users.service.delete_user", skip(self), fields(user_id = id))]
    pub async fn delete_user(&self, id: UserId) -> Result<bool, DomainError> {
        info!("Deleting user");

        let deleted = self.repo.delete(id).await.map_err(store_failure)?;

        if deleted {
            info!("Successfully deleted user");
        } else {
            debug!("No user to delete");
        }
        Ok(deleted)
    }

    // --- validation helpers ---

    fn validate_new_user(&self, new_user: NewUser) -> Result<NewUserRecord, DomainError> {
        let name = new_user.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name", "must not be blank"));
        }
        let email = new_user.email.trim();
        if email.is_empty() {
            return Err(DomainError::validation("email", "must not be blank"));
        }
        self.validate_name(name)?;
        self.validate_email(email)?;
        let age = match new_user.age {
            Some(age) => validate_age(age)?,
            None => return Err(DomainError::validation("age", "is required")),
        };

        Ok(NewUserRecord {
            name: name.to_string(),
            email: email.to_string(),
            age,
            // Microsecond precision round-trips exactly through every backend.
            created_at: Utc::now().trunc_subsecs(6),
        })
    }

    /// Normalize a patch: blank strings become `None`, the rest are trimmed and checked.
    fn validate_user_patch(&self, patch: UserPatch) -> Result<UserPatch, DomainError> {
        let name = non_blank(patch.name);
        if let Some(ref name) = name {
            self.validate_name(name)?;
        }
        let email = non_blank(patch.email);
        if let Some(ref email) = email {
            self.validate_email(email)?;
        }
        let age = patch.age.map(validate_age).transpose()?;
        Ok(UserPatch { name, email, age })
    }

    fn validate_name(&self, name: &str) -> Result<(), DomainError> {
        let len = name.chars().count();
        if len > self.config.max_name_length {
            return Err(DomainError::validation(
                "name",
                format!(
                    "is too long: {len} characters (max {})",
                    self.config.max_name_length
                ),
            ));
        }
        Ok(())
    }

    fn validate_email(&self, email: &str) -> Result<(), DomainError> {
        let len = email.chars().count();
        if len > self.config.max_email_length {
            return Err(DomainError::validation(
                "email",
                format!(
                    "is too long: {len} characters (max {})",
                    self.config.max_email_length
                ),
            ));
        }
        Ok(())
    }
}

fn validate_age(age: i32) -> Result<i32, DomainError> {
    if age < 0 {
        return Err(DomainError::validation("age", "must not be negative"));
    }
    Ok(age)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn store_failure(e: RepoError) -> DomainError {
    error!(error = %e, "User store operation failed");
    DomainError::database(e.to_string())
}
