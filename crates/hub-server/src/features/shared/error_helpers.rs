//! Database error handling utilities
//!
//! Helpers for recognising unique and foreign key violations so commands can
//! turn them into domain errors.
//!
//! # Examples
//!
//! ```rust,ignore
//! use hub_server::features::shared::error_helpers::map_unique_violation;
//!
//! sqlx::query("INSERT INTO ...")
//!     .execute(&pool)
//!     .await
//!     .map_err(|e| map_unique_violation(e, MyError::Duplicate, MyError::Database))?;
//! ```

use sqlx::Error as SqlxError;

/// Check if the error is a unique constraint violation
pub fn is_unique_violation(error: &SqlxError) -> bool {
    if let SqlxError::Database(db_err) = error {
        return db_err.is_unique_violation();
    }
    false
}

/// Check if the error is a foreign key violation
pub fn is_foreign_key_violation(error: &SqlxError) -> bool {
    if let SqlxError::Database(db_err) = error {
        return db_err.is_foreign_key_violation();
    }
    false
}

/// Name of the violated constraint, when the database reports one
pub fn violated_constraint(error: &SqlxError) -> Option<&str> {
    match error {
        SqlxError::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}

/// Map a unique violation to `unique_error`, wrapping anything else with `default_wrapper`
pub fn map_unique_violation<E, F>(error: SqlxError, unique_error: E, default_wrapper: F) -> E
where
    F: FnOnce(SqlxError) -> E,
{
    if is_unique_violation(&error) {
        unique_error
    } else {
        default_wrapper(error)
    }
}

/// Map a foreign key violation to `fk_error`, wrapping anything else with `default_wrapper`
pub fn map_foreign_key_violation<E, F>(error: SqlxError, fk_error: E, default_wrapper: F) -> E
where
    F: FnOnce(SqlxError) -> E,
{
    if is_foreign_key_violation(&error) {
        fk_error
    } else {
        default_wrapper(error)
    }
}
