//! Port for reading the course catalogue.

use async_trait::async_trait;

use crate::domain::{Course, CourseId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by course repository adapters.
    pub enum CourseRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "course repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "course repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// All courses ordered by title.
    async fn list(&self) -> Result<Vec<Course>, CourseRepositoryError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Course>, CourseRepositoryError>;

    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, CourseRepositoryError>;
}

/// Fixture implementation with an empty catalogue.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCourseRepository;

#[async_trait]
impl CourseRepository for FixtureCourseRepository {
    async fn list(&self) -> Result<Vec<Course>, CourseRepositoryError> {
        Ok(Vec::new())
    }

    async fn find_by_slug(&self, _slug: &str) -> Result<Option<Course>, CourseRepositoryError> {
        Ok(None)
    }

    async fn find_by_id(&self, _id: &CourseId) -> Result<Option<Course>, CourseRepositoryError> {
        Ok(None)
    }
}
