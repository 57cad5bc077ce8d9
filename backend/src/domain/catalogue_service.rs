//! Course catalogue and per-learner course progress.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use super::port_error_mapping::map_course_error;
use super::ports::{CatalogueQuery, CourseProgressView, CourseRepository};
use super::{Course, Error, ProgressTracker, UserId, derive_unlock_state, is_course_complete};

pub struct CatalogueService {
    courses: Arc<dyn CourseRepository>,
    tracker: Arc<ProgressTracker>,
}

impl CatalogueService {
    pub fn new(courses: Arc<dyn CourseRepository>, tracker: Arc<ProgressTracker>) -> Self {
        Self { courses, tracker }
    }
}

#[async_trait]
impl CatalogueQuery for CatalogueService {
    async fn list_courses(&self) -> Result<Vec<Course>, Error> {
        let mut courses = self.courses.list().await.map_err(map_course_error)?;
        courses.sort_by(|left, right| left.title.cmp(&right.title));
        Ok(courses)
    }

    async fn course_progress(
        &self,
        course_slug: &str,
        user_id: Option<UserId>,
    ) -> Result<CourseProgressView, Error> {
        let course = self
            .courses
            .find_by_slug(course_slug)
            .await
            .map_err(map_course_error)?
            .ok_or_else(|| Error::not_found(format!("course {course_slug} not found")))?;
        let completed = match &user_id {
            Some(user_id) => self.tracker.completed_modules(user_id, &course.id).await?,
            None => BTreeSet::new(),
        };
        let course_complete = is_course_complete(completed.len());
        Ok(CourseProgressView {
            modules: derive_unlock_state(&completed, user_id.is_some()),
            completed_count: completed.len(),
            course_complete,
            certification_available: user_id.is_some() && course_complete,
            course,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockCourseRepository, MockProgressRepository};
    use crate::domain::test_fixtures::{
        fixture_clock, fixture_timestamp, idle_awarder, sample_course, sample_module,
    };
    use crate::domain::{ErrorCode, ModuleCompletion};

    fn service(courses: MockCourseRepository, completed: i64) -> CatalogueService {
        let mut progress = MockProgressRepository::new();
        progress.expect_list_for_course().returning(move |_, course_id| {
            Ok((1..=completed)
                .map(|n| {
                    let module = sample_module(*course_id, n);
                    ModuleCompletion {
                        module_id: module.id,
                        course_id: *course_id,
                        module_number: module.number,
                        completed_at: fixture_timestamp(),
                    }
                })
                .collect())
        });
        CatalogueService::new(
            Arc::new(courses),
            Arc::new(ProgressTracker::new(
                Arc::new(progress),
                idle_awarder(),
                fixture_clock(),
            )),
        )
    }

    fn courses_with(course: Course) -> MockCourseRepository {
        let mut courses = MockCourseRepository::new();
        courses
            .expect_find_by_slug()
            .returning(move |_| Ok(Some(course.clone())));
        courses
    }

    #[tokio::test]
    async fn courses_are_listed_by_title() {
        let mut zig = sample_course();
        zig.title = "Zig".to_owned();
        let mut ada = sample_course();
        ada.title = "Ada".to_owned();
        let mut courses = MockCourseRepository::new();
        courses
            .expect_list()
            .times(1)
            .return_once(move || Ok(vec![zig, ada]));

        let listed = service(courses, 0).list_courses().await.expect("list");
        let titles: Vec<&str> = listed.iter().map(|course| course.title.as_str()).collect();
        assert_eq!(titles, vec!["Ada", "Zig"]);
    }

    #[tokio::test]
    async fn nine_modules_do_not_open_certification() {
        let view = service(courses_with(sample_course()), 9)
            .course_progress("rust-basics", Some(UserId::random()))
            .await
            .expect("progress");
        assert_eq!(view.completed_count, 9);
        assert!(!view.course_complete);
        assert!(!view.certification_available);
        assert!(view.modules.iter().all(|slot| slot.unlocked));
    }

    #[tokio::test]
    async fn tenth_module_opens_certification() {
        let view = service(courses_with(sample_course()), 10)
            .course_progress("rust-basics", Some(UserId::random()))
            .await
            .expect("progress");
        assert!(view.course_complete);
        assert!(view.certification_available);
    }

    #[tokio::test]
    async fn anonymous_progress_unlocks_everything() {
        let view = service(courses_with(sample_course()), 0)
            .course_progress("rust-basics", None)
            .await
            .expect("progress");
        assert_eq!(view.completed_count, 0);
        assert!(view.modules.iter().all(|slot| slot.unlocked));
        assert!(!view.certification_available);
    }

    #[tokio::test]
    async fn unknown_course_is_not_found() {
        let mut courses = MockCourseRepository::new();
        courses.expect_find_by_slug().return_once(|_| Ok(None));
        let err = service(courses, 0)
            .course_progress("nope", None)
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
