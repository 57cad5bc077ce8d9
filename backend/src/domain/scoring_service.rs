//! Attempt submission: grade, score, record, and follow up on passes.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::exam::SubmittedExam;
use super::port_error_mapping::{map_module_error, map_quiz_error, map_result_error};
use super::ports::{
    AnswerGrader, EvaluateQuizRequest, ModuleRepository, QcmReview, QuizAttemptResponse,
    QuizEvaluation, QuizRepository, ResultRepository,
};
use super::{
    Course, Error, MAX_SCORE, NewAttempt, OpenGrade, ProgressTracker, QcmQuestion, QuizType,
    Scorecard, UserId, grade_open, grade_qcm, is_course_complete, is_unlocked,
};

/// Grades quiz and exam submissions and appends them to the results log.
///
/// A result row is written only after every component is scored, so a
/// failed grading step never leaves a partial attempt behind.
pub struct ScoringService {
    quizzes: Arc<dyn QuizRepository>,
    modules: Arc<dyn ModuleRepository>,
    results: Arc<dyn ResultRepository>,
    grader: Arc<dyn AnswerGrader>,
    tracker: Arc<ProgressTracker>,
    clock: Arc<dyn Clock>,
}

impl ScoringService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        modules: Arc<dyn ModuleRepository>,
        results: Arc<dyn ResultRepository>,
        grader: Arc<dyn AnswerGrader>,
        tracker: Arc<ProgressTracker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            quizzes,
            modules,
            results,
            grader,
            tracker,
            clock,
        }
    }

    /// Score a submitted certification exam and record the attempt.
    ///
    /// Open answers fall back to partial credit when grading is unavailable,
    /// so only store failures surface as errors.
    pub async fn score_certification(
        &self,
        user_id: &UserId,
        course: &Course,
        exam: &SubmittedExam,
    ) -> Result<Scorecard, Error> {
        let qcm = grade_qcm(&exam.questions.qcm, &exam.answers.qcm);
        let open = grade_open(
            self.grader.as_ref(),
            &exam.questions.open,
            &exam.answers.open,
        )
        .await;
        let scorecard = Scorecard::compute(QuizType::Certification, &qcm, &open);

        let quiz_id = self
            .quizzes
            .ensure_certification_quiz(&course.id)
            .await
            .map_err(map_quiz_error)?;
        let result_id = self
            .results
            .insert(&NewAttempt {
                user_id: user_id.clone(),
                quiz_id,
                module_id: None,
                course_id: Some(course.id),
                score: scorecard.score,
                max_score: MAX_SCORE,
                answers: exam.answers.clone(),
                completed_at: self.clock.utc(),
            })
            .await
            .map_err(map_result_error)?;

        info!(
            user_id = %user_id,
            course = %course.slug,
            %result_id,
            score = scorecard.score,
            passed = scorecard.passed,
            open_fallback = scorecard.open_fallback,
            "certification scored"
        );
        Ok(scorecard)
    }
}

fn review(questions: &[QcmQuestion], correct: &[bool]) -> Vec<QcmReview> {
    questions
        .iter()
        .zip(correct)
        .map(|(question, hit)| QcmReview {
            correct: *hit,
            correct_option: question.correct(),
            explanation: question.explanation().map(str::to_owned),
        })
        .collect()
}

#[async_trait]
impl QuizEvaluation for ScoringService {
    async fn evaluate(&self, request: EvaluateQuizRequest) -> Result<QuizAttemptResponse, Error> {
        let EvaluateQuizRequest {
            user_id,
            quiz_id,
            answers,
        } = request;
        let quiz = self
            .quizzes
            .find_by_id(&quiz_id)
            .await
            .map_err(map_quiz_error)?
            .ok_or_else(|| Error::not_found(format!("quiz {quiz_id} not found")))?;
        if quiz.quiz_type != QuizType::Module {
            return Err(Error::invalid_request(
                "certification quizzes are taken through the certification exam",
            ));
        }
        let module_id = quiz
            .module_id
            .ok_or_else(|| Error::internal(format!("module quiz {quiz_id} has no module")))?;
        let module = self
            .modules
            .find_by_id(&module_id)
            .await
            .map_err(map_module_error)?
            .ok_or_else(|| Error::not_found(format!("module {module_id} not found")))?;

        let completed = self
            .tracker
            .completed_modules(&user_id, &module.course_id)
            .await?;
        if !is_unlocked(module.number, &completed, true) {
            return Err(Error::forbidden(format!(
                "module {} is locked until module {} is completed",
                module.number,
                module.number.get().saturating_sub(1)
            )));
        }

        // Module quizzes score on multiple choice only; open answers are kept
        // in the snapshot for reference.
        let qcm = grade_qcm(&quiz.questions.qcm, &answers.qcm);
        let scorecard = Scorecard::compute(QuizType::Module, &qcm, &OpenGrade::empty());
        let result_id = self
            .results
            .insert(&NewAttempt {
                user_id: user_id.clone(),
                quiz_id,
                module_id: Some(module.id),
                course_id: Some(module.course_id),
                score: scorecard.score,
                max_score: MAX_SCORE,
                answers,
                completed_at: self.clock.utc(),
            })
            .await
            .map_err(map_result_error)?;

        let (module_completed, course_complete, new_badges) = if scorecard.passed {
            let outcome = self.tracker.record_completion(&user_id, &module).await?;
            (
                outcome.newly_completed,
                is_course_complete(outcome.completed.len()),
                outcome.new_badges,
            )
        } else {
            (false, is_course_complete(completed.len()), Vec::new())
        };

        info!(
            user_id = %user_id,
            quiz_id = %quiz_id,
            module = %module.number,
            score = scorecard.score,
            passed = scorecard.passed,
            "module quiz scored"
        );
        Ok(QuizAttemptResponse {
            result_id,
            review: review(&quiz.questions.qcm, &qcm.correct),
            scorecard,
            module_completed,
            course_complete,
            new_badges,
        })
    }
}

#[cfg(test)]
#[path = "scoring_service_tests.rs"]
mod tests;
