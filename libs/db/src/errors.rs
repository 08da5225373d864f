//! Shared database error helpers (SQLSTATE categorization, etc.)

use sea_orm::{DbErr, SqlErr};

/// Returns true if the given SQLSTATE code represents a unique constraint violation
/// across the supported backends (Postgres 23505, SQLite 2067 / 1555).
pub fn is_unique_violation_code(code: &str) -> bool {
    matches!(code, "23505" | "2067" | "1555")
}

pub fn is_sqlx_unique_violation(db: &dyn sqlx::error::DatabaseError) -> bool {
    db.is_unique_violation()
        || db
            .code()
            .map(|c| is_unique_violation_code(c.as_ref()))
            .unwrap_or(false)
}

/// Classify a SeaORM error as a unique-constraint violation.
///
/// SeaORM recognizes the common codes itself; the raw driver error is checked as a
/// fallback so a violation never degrades into a generic store failure.
pub fn is_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    #[cfg(any(feature = "sqlite", feature = "pg"))]
    if let DbErr::Exec(sea_orm::RuntimeErr::SqlxError(e))
    | DbErr::Query(sea_orm::RuntimeErr::SqlxError(e)) = err
    {
        return e
            .as_database_error()
            .map(is_sqlx_unique_violation)
            .unwrap_or(false);
    }
    false
}
