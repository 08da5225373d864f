//! SeaORM-backed repository implementation for the domain port.
//!
//! Reads go straight to the connection. Every write runs in its own
//! transaction which is committed on success and rolled back on failure.
//! The connection must not be used while a transaction is open: in-memory
//! SQLite pools hold a single connection.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::warn;

use crate::contract::model::{User, UserId};
use crate::domain::repo::{NewUserRecord, RepoError, UsersRepository};
use crate::infra::storage::entity::{Column, Entity as UserEntity};
use crate::infra::storage::mapper::{new_record_to_active, user_to_active};

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    async fn begin(&self) -> Result<DatabaseTransaction, RepoError> {
        self.conn.begin().await.map_err(classify)
    }
}

/// Commit on success, roll back on failure. The transaction is consumed either way.
async fn finish<T>(
    txn: DatabaseTransaction,
    result: Result<T, RepoError>,
) -> Result<T, RepoError> {
    match result {
        Ok(value) => {
            txn.commit().await.map_err(classify)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rb) = txn.rollback().await {
                warn!(error = %rb, "rollback failed");
            }
            Err(e)
        }
    }
}

fn classify(e: DbErr) -> RepoError {
    if db::errors::is_unique_violation(&e) {
        RepoError::ConstraintViolation(e.to_string())
    } else {
        RepoError::Store(e)
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let found = UserEntity::find_by_id(id).one(&self.conn).await?;
        Ok(found.map(Into::into))
    }

    async fn find_all(&self) -> Result<Vec<User>, RepoError> {
        let rows = UserEntity::find()
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let found = UserEntity::find()
            .filter(Column::Email.eq(email))
            .one(&self.conn)
            .await?;
        Ok(found.map(Into::into))
    }

    async fn insert(&self, record: NewUserRecord) -> Result<User, RepoError> {
        let txn = self.begin().await?;
        let result = new_record_to_active(record)
            .insert(&txn)
            .await
            .map(User::from)
            .map_err(classify);
        finish(txn, result).await
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let id = user.id;
        let txn = self.begin().await?;
        let result = user_to_active(user)
            .update(&txn)
            .await
            .map(User::from)
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => RepoError::NotFound { id },
                other => classify(other),
            });
        finish(txn, result).await
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepoError> {
        let txn = self.begin().await?;
        let result = UserEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map(|res| res.rows_affected > 0)
            .map_err(classify);
        finish(txn, result).await
    }
}
