//! Shared translation of pool and Diesel failures into port errors.

use tracing::debug;

use crate::domain::ports::{
    CertificateRepositoryError, CourseRepositoryError, ModuleRepositoryError,
    ProfileRepositoryError, ProgressRepositoryError, QuizRepositoryError, ResultRepositoryError,
};

use super::models::RowDecodeError;
use super::pool::PoolError;

/// Port errors with the two failure classes every repository shares.
pub(crate) trait RepositoryError: Sized {
    fn connection_failure(message: String) -> Self;
    fn query_failure(message: String) -> Self;
}

macro_rules! impl_repository_error {
    ($($error:ty),+ $(,)?) => {
        $(
            impl RepositoryError for $error {
                fn connection_failure(message: String) -> Self {
                    Self::connection(message)
                }

                fn query_failure(message: String) -> Self {
                    Self::query(message)
                }
            }
        )+
    };
}

impl_repository_error!(
    CertificateRepositoryError,
    CourseRepositoryError,
    ModuleRepositoryError,
    ProfileRepositoryError,
    ProgressRepositoryError,
    QuizRepositoryError,
    ResultRepositoryError,
);

/// Diesel failure reduced to what the adapters act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    Connection(&'static str),
    Query(&'static str),
    UniqueViolation { constraint: Option<String> },
}

/// Log the raw Diesel error at debug level and classify it.
pub(crate) fn classify_diesel_error(error: &diesel::result::Error) -> DieselFailure {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(%error, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => DieselFailure::Query("record not found"),
        DieselError::QueryBuilderError(_) => DieselFailure::Query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DeserializationError(_) => DieselFailure::Query("stored row is malformed"),
        _ => DieselFailure::Query("database error"),
    }
}

pub(crate) fn map_pool_error<E: RepositoryError>(error: PoolError) -> E {
    E::connection_failure(error.into_message())
}

pub(crate) fn map_diesel_error<E: RepositoryError>(error: diesel::result::Error) -> E {
    match classify_diesel_error(&error) {
        DieselFailure::Connection(message) => E::connection_failure(message.to_owned()),
        DieselFailure::Query(message) => E::query_failure(message.to_owned()),
        DieselFailure::UniqueViolation { .. } => E::query_failure("duplicate record".to_owned()),
    }
}

/// Stored row that no longer decodes into the domain shape.
pub(crate) fn map_row_error<E: RepositoryError>(error: RowDecodeError) -> E {
    debug!(%error, "stored row failed to decode");
    E::query_failure(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    struct Info {
        constraint: Option<&'static str>,
    }

    impl DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            "boom"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            self.constraint
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind, constraint: Option<&'static str>) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(Info { constraint }))
    }

    #[rstest]
    fn closed_connections_are_connection_failures() {
        let error = database_error(DatabaseErrorKind::ClosedConnection, None);
        assert_eq!(
            classify_diesel_error(&error),
            DieselFailure::Connection("database connection error")
        );
        let mapped: QuizRepositoryError = map_diesel_error(error);
        assert!(matches!(mapped, QuizRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn unique_violations_carry_the_constraint() {
        let error = database_error(
            DatabaseErrorKind::UniqueViolation,
            Some("certificates_verification_code_key"),
        );
        assert_eq!(
            classify_diesel_error(&error),
            DieselFailure::UniqueViolation {
                constraint: Some("certificates_verification_code_key".to_owned()),
            }
        );
    }

    #[rstest]
    #[case(DieselError::NotFound)]
    #[case(DieselError::RollbackTransaction)]
    fn other_failures_are_query_failures(#[case] error: DieselError) {
        let mapped: ProfileRepositoryError = map_diesel_error(error);
        assert!(matches!(mapped, ProfileRepositoryError::Query { .. }));
    }

    #[rstest]
    fn pool_failures_are_connection_failures() {
        let mapped: CourseRepositoryError = map_pool_error(PoolError::checkout("timed out"));
        assert_eq!(mapped, CourseRepositoryError::connection("timed out"));
    }
}
