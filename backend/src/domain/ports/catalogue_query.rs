//! Driving port for browsing courses and course progress.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Course, Error, ModuleSlot, UserId};

/// Progress of one learner (or an anonymous visitor) through a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressView {
    pub course: Course,
    pub modules: Vec<ModuleSlot>,
    pub completed_count: usize,
    pub course_complete: bool,
    /// Authenticated and every module completed.
    pub certification_available: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueQuery: Send + Sync {
    async fn list_courses(&self) -> Result<Vec<Course>, Error>;

    async fn course_progress(
        &self,
        course_slug: &str,
        user_id: Option<UserId>,
    ) -> Result<CourseProgressView, Error>;
}

/// Fixture implementation with an empty catalogue.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCatalogueQuery;

#[async_trait]
impl CatalogueQuery for FixtureCatalogueQuery {
    async fn list_courses(&self) -> Result<Vec<Course>, Error> {
        Ok(Vec::new())
    }

    async fn course_progress(
        &self,
        course_slug: &str,
        _user_id: Option<UserId>,
    ) -> Result<CourseProgressView, Error> {
        Err(Error::not_found(format!("course {course_slug} not found")))
    }
}
