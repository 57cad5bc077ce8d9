//! Owned state machine for one certification attempt.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Answers, CourseId, IssuedCertificate, LearnerOpenQuestion, LearnerQcmQuestion, QuestionSet,
    Scorecard, UserId,
};

/// Time allowed for one attempt, from start to submission.
pub const EXAM_DURATION_SECS: i64 = 3600;

/// Where an attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ExamPhase {
    Intro,
    Qcm { index: usize },
    Open { index: usize },
    /// Answers are committed and grading is in flight.
    Grading,
    Result,
}

/// Lifecycle status derived from the phase and outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamStatus {
    NotStarted,
    InProgress,
    Completed,
    Expired,
}

/// How a finished attempt ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExamOutcome {
    Graded {
        scorecard: Scorecard,
        #[serde(skip_serializing_if = "Option::is_none")]
        certificate: Option<IssuedCertificate>,
    },
    /// The deadline passed before submission. Nothing was scored.
    TimedOut,
}

impl ExamOutcome {
    pub fn passed(&self) -> bool {
        match self {
            Self::Graded { scorecard, .. } => scorecard.passed,
            Self::TimedOut => false,
        }
    }
}

/// Answer to the question currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExamAnswer {
    Qcm { option: usize },
    Open { text: String },
}

/// Rejected exam actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExamError {
    #[error("the exam has not started")]
    NotStarted,
    #[error("the exam is already in progress")]
    AlreadyStarted,
    #[error("no certification questions are available for this course")]
    NoQuestions,
    #[error("the answer does not match the current question type")]
    AnswerMismatch,
    #[error("option {option} does not exist; the question has {options} options")]
    InvalidOption { option: usize, options: usize },
    #[error("already at the first question")]
    AtFirstQuestion,
    #[error("already at the last question")]
    AtLastQuestion,
    #[error("the exam can only be submitted from its last question")]
    NotAtFinalQuestion,
    #[error("the exam time is over")]
    TimedOut,
    #[error("the exam is being graded")]
    Grading,
    #[error("the exam is finished; retry to start again")]
    Finished,
}

/// Questions and answers committed by a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedExam {
    pub questions: QuestionSet,
    pub answers: Answers,
}

/// Question currently presented to the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurrentQuestion {
    Qcm {
        index: usize,
        #[serde(flatten)]
        question: LearnerQcmQuestion,
    },
    Open {
        index: usize,
        #[serde(flatten)]
        question: LearnerOpenQuestion,
    },
}

/// Snapshot of a session for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamView {
    #[serde(flatten)]
    pub phase: ExamPhase,
    pub status: ExamStatus,
    pub remaining_seconds: i64,
    pub qcm_count: usize,
    pub open_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<CurrentQuestion>,
    pub answers: Answers,
    pub can_submit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ExamOutcome>,
}

/// One learner's attempt at one course certification.
///
/// The deadline is an absolute instant fixed at start. Every action checks
/// it first, so an overdue session moves to `result` on the next action or
/// sweep, whichever comes first, and only once.
#[derive(Debug, Clone)]
pub struct ExamSession {
    user_id: UserId,
    course_id: CourseId,
    phase: ExamPhase,
    questions: QuestionSet,
    answers: Answers,
    started_at: Option<DateTime<Utc>>,
    deadline: Option<DateTime<Utc>>,
    outcome: Option<ExamOutcome>,
    finished_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    pub fn new(user_id: UserId, course_id: CourseId) -> Self {
        Self {
            user_id,
            course_id,
            phase: ExamPhase::Intro,
            questions: QuestionSet::default(),
            answers: Answers::default(),
            started_at: None,
            deadline: None,
            outcome: None,
            finished_at: None,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    pub fn phase(&self) -> ExamPhase {
        self.phase
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn outcome(&self) -> Option<&ExamOutcome> {
        self.outcome.as_ref()
    }

    pub fn status(&self) -> ExamStatus {
        match (&self.phase, &self.outcome) {
            (ExamPhase::Intro, _) => ExamStatus::NotStarted,
            (ExamPhase::Result, Some(ExamOutcome::TimedOut)) => ExamStatus::Expired,
            (ExamPhase::Result, _) => ExamStatus::Completed,
            _ => ExamStatus::InProgress,
        }
    }

    /// Whole seconds left before the deadline; zero when not running.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        match (self.phase, self.deadline) {
            (ExamPhase::Qcm { .. } | ExamPhase::Open { .. }, Some(deadline)) => {
                (deadline - now).num_seconds().max(0)
            }
            _ => 0,
        }
    }

    /// `intro -> qcm` (or straight to `open` when there are no
    /// multiple-choice questions). Starts the countdown.
    pub fn start(&mut self, questions: QuestionSet, now: DateTime<Utc>) -> Result<(), ExamError> {
        match self.phase {
            ExamPhase::Intro => {}
            ExamPhase::Qcm { .. } | ExamPhase::Open { .. } | ExamPhase::Grading => {
                return Err(ExamError::AlreadyStarted);
            }
            ExamPhase::Result => return Err(ExamError::Finished),
        }
        let first = first_phase(&questions).ok_or(ExamError::NoQuestions)?;
        self.questions = questions;
        self.answers.clear();
        self.outcome = None;
        self.started_at = Some(now);
        self.deadline = Some(now + Duration::seconds(EXAM_DURATION_SECS));
        self.phase = first;
        Ok(())
    }

    /// Record (or overwrite) the answer to the current question.
    pub fn answer(&mut self, answer: ExamAnswer, now: DateTime<Utc>) -> Result<(), ExamError> {
        self.ensure_running(now)?;
        match (self.phase, answer) {
            (ExamPhase::Qcm { index }, ExamAnswer::Qcm { option }) => {
                let options = self
                    .questions
                    .qcm
                    .get(index)
                    .map_or(0, |question| question.options().len());
                if option >= options {
                    return Err(ExamError::InvalidOption { option, options });
                }
                self.answers.qcm.insert(index, option);
                Ok(())
            }
            (ExamPhase::Open { index }, ExamAnswer::Open { text }) => {
                self.answers.open.insert(index, text);
                Ok(())
            }
            _ => Err(ExamError::AnswerMismatch),
        }
    }

    /// Move to the following question, crossing from `qcm` into `open`
    /// after the last multiple-choice question.
    pub fn next(&mut self, now: DateTime<Utc>) -> Result<(), ExamError> {
        self.ensure_running(now)?;
        let qcm_len = self.questions.qcm.len();
        let open_len = self.questions.open.len();
        self.phase = match self.phase {
            ExamPhase::Qcm { index } if index + 1 < qcm_len => ExamPhase::Qcm { index: index + 1 },
            ExamPhase::Qcm { .. } if open_len > 0 => ExamPhase::Open { index: 0 },
            ExamPhase::Open { index } if index + 1 < open_len => {
                ExamPhase::Open { index: index + 1 }
            }
            _ => return Err(ExamError::AtLastQuestion),
        };
        Ok(())
    }

    /// Move back one question. Answers already given are kept.
    pub fn previous(&mut self, now: DateTime<Utc>) -> Result<(), ExamError> {
        self.ensure_running(now)?;
        let qcm_len = self.questions.qcm.len();
        self.phase = match self.phase {
            ExamPhase::Qcm { index } if index > 0 => ExamPhase::Qcm { index: index - 1 },
            ExamPhase::Open { index } if index > 0 => ExamPhase::Open { index: index - 1 },
            ExamPhase::Open { .. } if qcm_len > 0 => ExamPhase::Qcm { index: qcm_len - 1 },
            _ => return Err(ExamError::AtFirstQuestion),
        };
        Ok(())
    }

    /// Whether the current question is the last one of the attempt.
    pub fn at_final_question(&self) -> bool {
        let qcm_len = self.questions.qcm.len();
        let open_len = self.questions.open.len();
        match self.phase {
            ExamPhase::Open { index } => index + 1 == open_len,
            ExamPhase::Qcm { index } => open_len == 0 && index + 1 == qcm_len,
            _ => false,
        }
    }

    /// Commit the answers for grading. The deadline no longer applies once
    /// this succeeds.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<SubmittedExam, ExamError> {
        self.ensure_running(now)?;
        if !self.at_final_question() {
            return Err(ExamError::NotAtFinalQuestion);
        }
        self.phase = ExamPhase::Grading;
        Ok(SubmittedExam {
            questions: self.questions.clone(),
            answers: self.answers.clone(),
        })
    }

    /// `grading -> result` with the graded outcome.
    pub fn complete(&mut self, outcome: ExamOutcome, now: DateTime<Utc>) {
        if self.phase == ExamPhase::Grading {
            self.phase = ExamPhase::Result;
            self.outcome = Some(outcome);
            self.finished_at = Some(now);
        }
    }

    /// Whether the session reached `result` at or before `cutoff`.
    pub fn finished_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.phase == ExamPhase::Result && self.finished_at.is_some_and(|at| at <= cutoff)
    }

    /// Grading failed; drop the attempt back to `intro` so the learner can
    /// start over.
    pub fn abandon_grading(&mut self) {
        if self.phase == ExamPhase::Grading {
            self.reset();
        }
    }

    /// Force the timeout transition if the deadline has passed.
    ///
    /// Clears every answer and question; nothing is scored. Returns `true`
    /// only on the call that performs the transition.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        let running = matches!(self.phase, ExamPhase::Qcm { .. } | ExamPhase::Open { .. });
        let overdue = self.deadline.is_some_and(|deadline| now >= deadline);
        if !(running && overdue) {
            return false;
        }
        self.phase = ExamPhase::Result;
        self.outcome = Some(ExamOutcome::TimedOut);
        self.finished_at = Some(now);
        self.answers.clear();
        self.questions = QuestionSet::default();
        true
    }

    /// Reset fully to `intro`, discarding answers, questions, and timer.
    pub fn retry(&mut self) -> Result<(), ExamError> {
        if self.phase == ExamPhase::Grading {
            return Err(ExamError::Grading);
        }
        self.reset();
        Ok(())
    }

    pub fn view(&self, now: DateTime<Utc>) -> ExamView {
        let current_question = match self.phase {
            ExamPhase::Qcm { index } => self.questions.qcm.get(index).map(|question| {
                CurrentQuestion::Qcm {
                    index,
                    question: question.into(),
                }
            }),
            ExamPhase::Open { index } => self.questions.open.get(index).map(|question| {
                CurrentQuestion::Open {
                    index,
                    question: question.into(),
                }
            }),
            _ => None,
        };
        ExamView {
            phase: self.phase,
            status: self.status(),
            remaining_seconds: self.remaining_secs(now),
            qcm_count: self.questions.qcm.len(),
            open_count: self.questions.open.len(),
            current_question,
            answers: self.answers.clone(),
            can_submit: self.at_final_question(),
            passed: self.outcome.as_ref().map(ExamOutcome::passed),
            outcome: self.outcome.clone(),
        }
    }

    fn ensure_running(&mut self, now: DateTime<Utc>) -> Result<(), ExamError> {
        if self.expire_if_due(now) {
            return Err(ExamError::TimedOut);
        }
        match self.phase {
            ExamPhase::Qcm { .. } | ExamPhase::Open { .. } => Ok(()),
            ExamPhase::Intro => Err(ExamError::NotStarted),
            ExamPhase::Grading => Err(ExamError::Grading),
            ExamPhase::Result => match self.outcome {
                Some(ExamOutcome::TimedOut) => Err(ExamError::TimedOut),
                _ => Err(ExamError::Finished),
            },
        }
    }

    fn reset(&mut self) {
        self.phase = ExamPhase::Intro;
        self.questions = QuestionSet::default();
        self.answers.clear();
        self.started_at = None;
        self.deadline = None;
        self.outcome = None;
        self.finished_at = None;
    }
}

fn first_phase(questions: &QuestionSet) -> Option<ExamPhase> {
    if !questions.qcm.is_empty() {
        Some(ExamPhase::Qcm { index: 0 })
    } else if !questions.open.is_empty() {
        Some(ExamPhase::Open { index: 0 })
    } else {
        None
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
