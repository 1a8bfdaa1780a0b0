//! Diesel and pool error translation shared by the repositories.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Classification of a Diesel failure, before it becomes a port error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreFailure {
    Connection(&'static str),
    UniqueViolation { constraint: Option<String> },
    Query(&'static str),
}

pub(crate) fn pool_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

pub(crate) fn classify(error: DieselError) -> StoreFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => StoreFailure::Query("record not found"),
        DieselError::QueryBuilderError(_) => StoreFailure::Query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            StoreFailure::Connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            StoreFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DeserializationError(_) | DieselError::SerializationError(_) => {
            StoreFailure::Query("database value conversion error")
        }
        _ => StoreFailure::Query("database error"),
    }
}

/// Domain revisions are `u32`; the column is `INTEGER`.
pub(crate) fn revision_to_db(revision: u32) -> Result<i32, String> {
    i32::try_from(revision).map_err(|_| format!("revision {revision} exceeds column range"))
}

pub(crate) fn revision_from_db(revision: i32) -> Result<u32, String> {
    u32::try_from(revision).map_err(|_| format!("stored revision {revision} is negative"))
}
