use sea_orm::Set;

use crate::contract::model::User;
use crate::domain::repo::NewUserRecord;
use crate::infra::storage::entity::{ActiveModel, Model};

impl From<Model> for User {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            age: m.age,
            created_at: m.created_at,
        }
    }
}

/// Active model for an insert; the id column is left for the store to assign.
pub fn new_record_to_active(record: NewUserRecord) -> ActiveModel {
    ActiveModel {
        name: Set(record.name),
        email: Set(record.email),
        age: Set(record.age),
        created_at: Set(record.created_at),
        ..Default::default()
    }
}

/// Active model that overwrites every mutable column of an existing row.
pub fn user_to_active(user: User) -> ActiveModel {
    ActiveModel {
        id: Set(user.id),
        name: Set(user.name),
        email: Set(user.email),
        age: Set(user.age),
        created_at: Set(user.created_at),
    }
}
