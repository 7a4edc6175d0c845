//! Translation from sqlx failures to the repository error taxonomy.

use sqlx::error::ErrorKind;

use crate::application::repos::RepoError;

/// Statement-timeout cancellations surface as a generic database error;
/// Postgres identifies them only by message.
const STATEMENT_TIMEOUT_MARKER: &str = "canceling statement";

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) => match db.kind() {
            ErrorKind::UniqueViolation => RepoError::Duplicate {
                constraint: db.constraint().unwrap_or("unknown").to_string(),
            },
            ErrorKind::ForeignKeyViolation | ErrorKind::NotNullViolation => {
                RepoError::InvalidInput {
                    message: db.message().to_string(),
                }
            }
            ErrorKind::CheckViolation => RepoError::Integrity {
                message: db.message().to_string(),
            },
            _ if db.message().contains(STATEMENT_TIMEOUT_MARKER) => RepoError::Timeout,
            _ => RepoError::from_persistence(db),
        },
        other => RepoError::from_persistence(other),
    }
}
