use std::time::Duration;

use sqlx::error::ErrorKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Query did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Edit conflict on record {id}, version {version} is stale")]
    EditConflict { id: i64, version: i32 },

    #[error("Invalid genres value: {0}")]
    GenreDecode(#[from] serde_json::Error),

    #[error("Invalid order by field: {0}")]
    InvalidOrderByField(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] garde::Report),
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        match &value {
            sqlx::Error::Database(db_error)
                if matches!(
                    db_error.kind(),
                    ErrorKind::CheckViolation
                        | ErrorKind::NotNullViolation
                        | ErrorKind::UniqueViolation
                        | ErrorKind::ForeignKeyViolation
                ) =>
            {
                Error::ConstraintViolation(db_error.message().to_string())
            }
            _ => Error::DatabaseError(value),
        }
    }
}

