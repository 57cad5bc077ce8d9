//! Port for per-user module completion records.

use async_trait::async_trait;

use crate::domain::{CompletionWrite, CourseId, ModuleCompletion, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by progress repository adapters.
    pub enum ProgressRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "progress repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "progress repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Upsert a completed row keyed by `(user, module)` and, only when the
    /// row was not already completed, add `write.points` to the learner's
    /// profile in the same transaction.
    ///
    /// Returns `true` when this call completed the module for the first time.
    async fn record_completion(&self, write: &CompletionWrite)
    -> Result<bool, ProgressRepositoryError>;

    /// Completed modules of one course for a user.
    async fn list_for_course(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<ModuleCompletion>, ProgressRepositoryError>;

    /// Every completed module of a user across courses.
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ModuleCompletion>, ProgressRepositoryError>;
}

/// Fixture implementation where nothing is ever completed.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProgressRepository;

#[async_trait]
impl ProgressRepository for FixtureProgressRepository {
    async fn record_completion(
        &self,
        _write: &CompletionWrite,
    ) -> Result<bool, ProgressRepositoryError> {
        Ok(false)
    }

    async fn list_for_course(
        &self,
        _user_id: &UserId,
        _course_id: &CourseId,
    ) -> Result<Vec<ModuleCompletion>, ProgressRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_for_user(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<ModuleCompletion>, ProgressRepositoryError> {
        Ok(Vec::new())
    }
}
