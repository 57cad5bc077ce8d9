//! Driving port for grading module quiz attempts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Answers, Badge, Error, QuizId, Scorecard, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluateQuizRequest {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub answers: Answers,
}

/// Per-question feedback revealed after grading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QcmReview {
    pub correct: bool,
    pub correct_option: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttemptResponse {
    pub result_id: Uuid,
    #[serde(flatten)]
    pub scorecard: Scorecard,
    pub review: Vec<QcmReview>,
    /// True only when this attempt completed the module for the first time.
    pub module_completed: bool,
    pub course_complete: bool,
    pub new_badges: Vec<Badge>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizEvaluation: Send + Sync {
    async fn evaluate(&self, request: EvaluateQuizRequest) -> Result<QuizAttemptResponse, Error>;
}

/// Fixture implementation where no quiz exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureQuizEvaluation;

#[async_trait]
impl QuizEvaluation for FixtureQuizEvaluation {
    async fn evaluate(&self, request: EvaluateQuizRequest) -> Result<QuizAttemptResponse, Error> {
        Err(Error::not_found(format!("quiz {} not found", request.quiz_id)))
    }
}
