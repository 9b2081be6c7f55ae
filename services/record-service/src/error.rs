//! Error types for the record service.

use sqlx::error::ErrorKind;
use tonic::Status;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for record service operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Redis returned an error other than a missing key.
    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),
    /// No record exists with the requested id.
    #[error("record not found: id {0}")]
    RecordNotFound(i64),
    /// The store rejected a write because it violates a table constraint.
    #[error("constraint violation: {0}")]
    Constraint(String),
    /// Any other database failure.
    #[error("database error: {0}")]
    Database(sqlx::Error),
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(Box<figment::Error>),
    /// Invalid listen address.
    #[error("invalid address: {0}")]
    Addr(#[from] std::net::AddrParseError),
    /// Log file could not be opened.
    #[error("log file error: {0}")]
    LogInit(#[from] tracing_appender::rolling::InitError),
    /// I/O failure, including binding the listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The gRPC transport failed while serving.
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) if !matches!(db.kind(), ErrorKind::Other) => {
                Self::Constraint(db.message().to_string())
            }
            other => Self::Database(other),
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        match err {
            Error::RecordNotFound(_) => Self::not_found(message),
            Error::Constraint(_) => Self::invalid_argument(message),
            Error::Cache(_) => Self::unavailable(message),
            _ => Self::internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::DatabaseError;
    use std::fmt;
    use tonic::Code;

    #[derive(Debug)]
    struct FakeDbError {
        kind: ErrorKind,
        message: &'static str,
    }

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl std::error::Error for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            self.message
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.kind {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                ErrorKind::NotNullViolation => ErrorKind::NotNullViolation,
                ErrorKind::CheckViolation => ErrorKind::CheckViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn db_error(kind: ErrorKind, message: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { kind, message }))
    }

    #[test]
    fn test_check_violation_becomes_invalid_argument() {
        let err = Error::from(db_error(
            ErrorKind::CheckViolation,
            "new row for relation \"records\" violates check constraint \"records_field_not_empty\"",
        ));
        assert!(matches!(&err, Error::Constraint(msg) if msg.contains("records_field_not_empty")));

        let status = Status::from(err);
        assert_eq!(status.code(), Code::InvalidArgument);
        assert!(status.message().contains("violates check constraint"));
    }

    #[test]
    fn test_not_null_violation_is_a_constraint() {
        let err = Error::from(db_error(
            ErrorKind::NotNullViolation,
            "null value in column \"field\" violates not-null constraint",
        ));
        assert!(matches!(err, Error::Constraint(_)));
    }

    #[test]
    fn test_other_database_error_stays_internal() {
        let err = Error::from(db_error(ErrorKind::Other, "relation \"records\" does not exist"));
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(Status::from(err).code(), Code::Internal);
    }

    #[test]
    fn test_not_found_status() {
        let status = Status::from(Error::RecordNotFound(42));
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "record not found: id 42");
    }

    #[test]
    fn test_constraint_status() {
        let status = Status::from(Error::Constraint("violates check constraint".into()));
        assert_eq!(status.code(), Code::InvalidArgument);
        assert!(status.message().contains("violates check constraint"));
    }

    #[test]
    fn test_cache_status_keeps_message() {
        let err = redis::RedisError::from((redis::ErrorKind::IoError, "connection refused"));
        let status = Status::from(Error::from(err));
        assert_eq!(status.code(), Code::Unavailable);
        assert!(status.message().contains("connection refused"));
    }

    #[test]
    fn test_row_not_found_is_plain_database_error() {
        let err = Error::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, Error::Database(sqlx::Error::RowNotFound)));
        assert_eq!(Status::from(err).code(), Code::Internal);
    }
}
