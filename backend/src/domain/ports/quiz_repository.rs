//! Port for quiz lookups.

use async_trait::async_trait;

use crate::domain::{CourseId, ModuleId, ModuleNumber, Quiz, QuizId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by quiz repository adapters.
    pub enum QuizRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "quiz repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "quiz repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn find_by_id(&self, id: &QuizId) -> Result<Option<Quiz>, QuizRepositoryError>;

    /// Most recently created module quiz for a module.
    async fn latest_for_module(&self, module_id: &ModuleId)
    -> Result<Option<Quiz>, QuizRepositoryError>;

    /// Most recent module quiz of every generated module of a course,
    /// ordered by module number.
    async fn latest_module_quizzes(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<(ModuleNumber, Quiz)>, QuizRepositoryError>;

    /// Return the course's certification quiz, creating an empty one on
    /// first use. Certification results reference it.
    async fn ensure_certification_quiz(
        &self,
        course_id: &CourseId,
    ) -> Result<QuizId, QuizRepositoryError>;
}

/// Fixture implementation with no quizzes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureQuizRepository;

#[async_trait]
impl QuizRepository for FixtureQuizRepository {
    async fn find_by_id(&self, _id: &QuizId) -> Result<Option<Quiz>, QuizRepositoryError> {
        Ok(None)
    }

    async fn latest_for_module(
        &self,
        _module_id: &ModuleId,
    ) -> Result<Option<Quiz>, QuizRepositoryError> {
        Ok(None)
    }

    async fn latest_module_quizzes(
        &self,
        _course_id: &CourseId,
    ) -> Result<Vec<(ModuleNumber, Quiz)>, QuizRepositoryError> {
        Ok(Vec::new())
    }

    async fn ensure_certification_quiz(
        &self,
        _course_id: &CourseId,
    ) -> Result<QuizId, QuizRepositoryError> {
        Ok(QuizId::random())
    }
}
