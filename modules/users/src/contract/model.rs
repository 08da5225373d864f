use chrono::{DateTime, Utc};

/// Store-assigned user identifier.
pub type UserId = i32;

/// Pure user model for in-process consumers (no serde/utoipa)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new user.
///
/// `age` is optional on the wire so that a missing value surfaces as a
/// validation error instead of a decoding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
}

/// Partial update data for a user. `None` or blank strings keep the current value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
}
