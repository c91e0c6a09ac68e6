use sea_orm::{DbErr, RuntimeErr, SqlErr, sqlx};
use std::fmt;
use uuid::Uuid;

#[derive(Debug)]
pub enum DaoLayerError {
    Db(DbErr),
    NotFound { entity: &'static str, id: Uuid },
    /// A unique constraint rejected the write.
    Duplicate {
        entity: &'static str,
        field: &'static str,
    },
}

pub type DaoResult<T> = Result<T, DaoLayerError>;

impl fmt::Display for DaoLayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaoLayerError::Db(err) => write!(f, "Database error: {err}"),
            DaoLayerError::NotFound { entity, id } => {
                write!(f, "{entity} not found (id={id})")
            }
            DaoLayerError::Duplicate { entity, field } => {
                write!(f, "{entity}.{field} already exists")
            }
        }
    }
}

impl std::error::Error for DaoLayerError {}

/// True when the driver reported a unique/primary key violation.
///
/// `sql_err` only recognizes the concrete driver error types, so the
/// driver-neutral `DatabaseError::kind` is checked as well.
pub fn is_unique_violation(err: &DbErr) -> bool {
    if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
        return true;
    }
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(inner)) | DbErr::Query(RuntimeErr::SqlxError(inner)) => {
            matches!(inner.as_ref(), sqlx::Error::Database(db) if db.is_unique_violation())
        }
        _ => false,
    }
}
