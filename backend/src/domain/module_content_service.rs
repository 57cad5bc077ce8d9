//! Module content retrieval with generate-on-first-access.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::port_error_mapping::{
    map_course_error, map_generation_error, map_module_error, map_quiz_error,
};
use super::ports::{
    ContentGenerator, CourseRepository, GeneratedModule, GeneratedModuleRecord, GenerationRequest,
    ModuleContentQuery, ModuleRepository, ModuleRequest, ModuleView, QuizRepository,
};
use super::{Course, Error, LearnerQuiz, Module, ModuleNumber, ProgressTracker, Quiz, is_unlocked};

/// Reasons generated content is refused before anything is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeneratedContentError {
    #[error("module title is empty")]
    EmptyTitle,
    #[error("module explanation is empty")]
    EmptyExplanation,
    #[error("module has no multiple-choice questions")]
    NoQuestions,
    #[error("an open question has no text")]
    EmptyOpenQuestion,
}

/// Check generator output is complete enough to store.
///
/// Multiple-choice questions are already well formed by construction, so
/// only the surrounding content is checked here.
pub fn validate_generated(generated: &GeneratedModule) -> Result<(), GeneratedContentError> {
    if generated.title.trim().is_empty() {
        return Err(GeneratedContentError::EmptyTitle);
    }
    if generated.content.explanation.trim().is_empty() {
        return Err(GeneratedContentError::EmptyExplanation);
    }
    if generated.questions.qcm.is_empty() {
        return Err(GeneratedContentError::NoQuestions);
    }
    if generated
        .questions
        .open
        .iter()
        .any(|question| question.question.trim().is_empty())
    {
        return Err(GeneratedContentError::EmptyOpenQuestion);
    }
    Ok(())
}

/// Serves modules, generating and storing them the first time they are
/// opened.
pub struct ModuleContentService {
    courses: Arc<dyn CourseRepository>,
    modules: Arc<dyn ModuleRepository>,
    quizzes: Arc<dyn QuizRepository>,
    generator: Arc<dyn ContentGenerator>,
    tracker: Arc<ProgressTracker>,
}

impl ModuleContentService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        modules: Arc<dyn ModuleRepository>,
        quizzes: Arc<dyn QuizRepository>,
        generator: Arc<dyn ContentGenerator>,
        tracker: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            courses,
            modules,
            quizzes,
            generator,
            tracker,
        }
    }

    async fn cached(
        &self,
        course: &Course,
        number: ModuleNumber,
    ) -> Result<Option<(Module, Quiz)>, Error> {
        let Some(module) = self
            .modules
            .find_by_number(&course.id, number)
            .await
            .map_err(map_module_error)?
        else {
            return Ok(None);
        };
        let quiz = self
            .quizzes
            .latest_for_module(&module.id)
            .await
            .map_err(map_quiz_error)?;
        Ok(quiz.map(|quiz| (module, quiz)))
    }

    async fn generate(
        &self,
        course: &Course,
        number: ModuleNumber,
    ) -> Result<(Module, Quiz), Error> {
        let request = GenerationRequest {
            course_slug: course.slug.clone(),
            course_title: course.title.clone(),
            course_level: course.level,
            module_number: number,
        };
        let generated = self
            .generator
            .generate(&request)
            .await
            .map_err(|error| {
                warn!(%error, course = %course.slug, module = %number, "module generation failed");
                map_generation_error(error)
            })?;
        validate_generated(&generated).map_err(|error| {
            warn!(%error, course = %course.slug, module = %number, "generated module rejected");
            Error::service_unavailable(
                "Module generation returned incomplete content. Please try again.",
            )
        })?;

        let record = GeneratedModuleRecord {
            course_id: course.id,
            number,
            title: generated.title,
            content: generated.content,
            questions: generated.questions,
        };
        let saved = self
            .modules
            .save_generated(&record)
            .await
            .map_err(map_module_error)?;
        info!(
            course = %course.slug,
            module = %number,
            qcm = record.questions.qcm.len(),
            open = record.questions.open.len(),
            "module generated"
        );
        Ok(saved)
    }
}

#[async_trait]
impl ModuleContentQuery for ModuleContentService {
    async fn get_module(&self, request: ModuleRequest) -> Result<ModuleView, Error> {
        let course = self
            .courses
            .find_by_slug(&request.course_slug)
            .await
            .map_err(map_course_error)?
            .ok_or_else(|| Error::not_found(format!("course {} not found", request.course_slug)))?;

        let completed = match &request.user_id {
            Some(user_id) => self.tracker.completed_modules(user_id, &course.id).await?,
            None => BTreeSet::new(),
        };
        if !is_unlocked(request.module_number, &completed, request.user_id.is_some()) {
            return Err(Error::forbidden(format!(
                "module {} is locked; complete the previous module first",
                request.module_number
            )));
        }

        let (module, quiz) = match self.cached(&course, request.module_number).await? {
            Some(pair) => pair,
            None => self.generate(&course, request.module_number).await?,
        };
        Ok(ModuleView {
            course_slug: course.slug,
            course_title: course.title,
            completed: completed.contains(&module.number),
            quiz: LearnerQuiz::from(&quiz),
            module,
        })
    }
}

#[cfg(test)]
#[path = "module_content_service_tests.rs"]
mod tests;
