//! Port for the external open-answer grading service.

use async_trait::async_trait;

use super::AiProviderError;

/// Maximum points the grader may award to one open answer.
pub const OPEN_POINTS_PER_QUESTION: u32 = 5;

/// One open question to grade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingItem {
    pub question: String,
    pub expected_answer: String,
    /// `None` when the learner left the question blank.
    pub learner_answer: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerGrader: Send + Sync {
    /// Grade the whole batch in one call.
    ///
    /// On success the returned vector has exactly one score in
    /// `0..=OPEN_POINTS_PER_QUESTION` per item, in order.
    async fn grade(&self, items: &[GradingItem]) -> Result<Vec<u32>, AiProviderError>;
}

/// Fixture implementation that always fails, exercising the fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAnswerGrader;

#[async_trait]
impl AnswerGrader for FixtureAnswerGrader {
    async fn grade(&self, _items: &[GradingItem]) -> Result<Vec<u32>, AiProviderError> {
        Err(AiProviderError::not_configured())
    }
}
