//! Port for module persistence.
//!
//! Generated content is written together with its module quiz so a module
//! never exists half-generated.

use async_trait::async_trait;

use crate::domain::{CourseId, Module, ModuleContent, ModuleId, ModuleNumber, QuestionSet, Quiz};

use super::define_port_error;

define_port_error! {
    /// Errors raised by module repository adapters.
    pub enum ModuleRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "module repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "module repository query failed: {message}",
    }
}

/// Validated generator output ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModuleRecord {
    pub course_id: CourseId,
    pub number: ModuleNumber,
    pub title: String,
    pub content: ModuleContent,
    pub questions: QuestionSet,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModuleRepository: Send + Sync {
    async fn find_by_number(
        &self,
        course_id: &CourseId,
        number: ModuleNumber,
    ) -> Result<Option<Module>, ModuleRepositoryError>;

    async fn find_by_id(&self, id: &ModuleId) -> Result<Option<Module>, ModuleRepositoryError>;

    /// Upsert the module keyed by `(course_id, number)`, overwriting any
    /// previous content, and insert a new module quiz, atomically.
    async fn save_generated(
        &self,
        record: &GeneratedModuleRecord,
    ) -> Result<(Module, Quiz), ModuleRepositoryError>;
}

/// Fixture implementation that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureModuleRepository;

#[async_trait]
impl ModuleRepository for FixtureModuleRepository {
    async fn find_by_number(
        &self,
        _course_id: &CourseId,
        _number: ModuleNumber,
    ) -> Result<Option<Module>, ModuleRepositoryError> {
        Ok(None)
    }

    async fn find_by_id(&self, _id: &ModuleId) -> Result<Option<Module>, ModuleRepositoryError> {
        Ok(None)
    }

    async fn save_generated(
        &self,
        _record: &GeneratedModuleRecord,
    ) -> Result<(Module, Quiz), ModuleRepositoryError> {
        Err(ModuleRepositoryError::query("fixture repository does not store modules"))
    }
}
