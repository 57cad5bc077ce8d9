//! Port for the append-only log of graded attempts.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::NewAttempt;

use super::define_port_error;

define_port_error! {
    /// Errors raised by result repository adapters.
    pub enum ResultRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "result repository connection failed: {message}",
        /// Insert failed during execution.
        Query { message: String } => "result repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Insert one result row and return its id. Rows are never updated.
    async fn insert(&self, attempt: &NewAttempt) -> Result<Uuid, ResultRepositoryError>;
}

/// Fixture implementation that discards attempts.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureResultRepository;

#[async_trait]
impl ResultRepository for FixtureResultRepository {
    async fn insert(&self, _attempt: &NewAttempt) -> Result<Uuid, ResultRepositoryError> {
        Ok(Uuid::new_v4())
    }
}
