//! Port for the external module content generator.

use async_trait::async_trait;

use crate::domain::{CourseLevel, ModuleContent, ModuleNumber, QuestionSet};

use super::AiProviderError;

/// Number of multiple-choice questions requested per module.
pub const GENERATED_QCM_COUNT: usize = 20;
/// Number of open questions requested per module.
pub const GENERATED_OPEN_COUNT: usize = 4;

/// Inputs for generating one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub course_slug: String,
    pub course_title: String,
    pub course_level: CourseLevel,
    pub module_number: ModuleNumber,
}

/// Structured generator output. Adapters must only return values that
/// passed schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    pub title: String,
    pub content: ModuleContent,
    pub questions: QuestionSet,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
    -> Result<GeneratedModule, AiProviderError>;
}

/// Fixture implementation used when no provider is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureContentGenerator;

#[async_trait]
impl ContentGenerator for FixtureContentGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GeneratedModule, AiProviderError> {
        Err(AiProviderError::not_configured())
    }
}
