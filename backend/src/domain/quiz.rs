//! Quizzes, their two question collections, and learner answers.
//!
//! A quiz stores its questions as one JSON document:
//! `{"qcm": [...], "open": [...]}`. Answer keys (correct indices, expected
//! answers, explanations) never leave the domain except through
//! [`LearnerQuiz`], which strips them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CourseId, ModuleId};

/// Stable quiz identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizId(Uuid);

impl QuizId {
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validation failures for quiz content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizValidationError {
    #[error("question text must not be empty")]
    EmptyQuestion,
    #[error("a multiple-choice question needs at least two options, got {0}")]
    TooFewOptions(usize),
    #[error("correct option {correct} is out of range for {options} options")]
    CorrectOutOfRange { correct: usize, options: usize },
    #[error("unknown quiz type: {0}")]
    UnknownQuizType(String),
}

/// Whether a quiz closes a module or certifies a whole course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizType {
    Module,
    Certification,
}

impl QuizType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Certification => "certification",
        }
    }
}

impl FromStr for QuizType {
    type Err = QuizValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "module" => Ok(Self::Module),
            "certification" => Ok(Self::Certification),
            other => Err(QuizValidationError::UnknownQuizType(other.to_owned())),
        }
    }
}

/// Multiple-choice question with exactly one correct option.
///
/// ## Invariants
/// - the question text is non-empty;
/// - there are at least two options;
/// - `correct` indexes into `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QcmQuestionDto", into = "QcmQuestionDto")]
pub struct QcmQuestion {
    question: String,
    options: Vec<String>,
    correct: usize,
    explanation: Option<String>,
}

impl QcmQuestion {
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct: usize,
    ) -> Result<Self, QuizValidationError> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(QuizValidationError::EmptyQuestion);
        }
        if options.len() < 2 {
            return Err(QuizValidationError::TooFewOptions(options.len()));
        }
        if correct >= options.len() {
            return Err(QuizValidationError::CorrectOutOfRange {
                correct,
                options: options.len(),
            });
        }
        Ok(Self {
            question,
            options,
            correct,
            explanation: None,
        })
    }

    /// Attach the explanation revealed after grading.
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        let explanation = explanation.into();
        self.explanation = (!explanation.trim().is_empty()).then_some(explanation);
        self
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}

#[derive(Serialize, Deserialize)]
struct QcmQuestionDto {
    question: String,
    options: Vec<String>,
    correct: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

impl TryFrom<QcmQuestionDto> for QcmQuestion {
    type Error = QuizValidationError;

    fn try_from(value: QcmQuestionDto) -> Result<Self, Self::Error> {
        let question = Self::new(value.question, value.options, value.correct)?;
        Ok(match value.explanation {
            Some(explanation) => question.with_explanation(explanation),
            None => question,
        })
    }
}

impl From<QcmQuestion> for QcmQuestionDto {
    fn from(value: QcmQuestion) -> Self {
        Self {
            question: value.question,
            options: value.options,
            correct: value.correct,
            explanation: value.explanation,
        }
    }
}

/// Free-text question graded against a reference answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenQuestion {
    pub question: String,
    /// Grading hint only; never shown to the learner.
    pub expected_answer: String,
}

/// The two question collections of a quiz.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    #[serde(default)]
    pub qcm: Vec<QcmQuestion>,
    #[serde(default)]
    pub open: Vec<OpenQuestion>,
}

impl QuestionSet {
    pub fn is_empty(&self) -> bool {
        self.qcm.is_empty() && self.open.is_empty()
    }
}

/// A persisted quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    pub id: QuizId,
    pub module_id: Option<ModuleId>,
    pub course_id: Option<CourseId>,
    pub quiz_type: QuizType,
    pub questions: QuestionSet,
}

/// Learner answers keyed by question index.
///
/// `qcm` maps a question index to the chosen option index and `open` maps a
/// question index to free text. Missing keys are unanswered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answers {
    #[serde(default)]
    pub qcm: BTreeMap<usize, usize>,
    #[serde(default)]
    pub open: BTreeMap<usize, String>,
}

impl Answers {
    pub fn is_empty(&self) -> bool {
        self.qcm.is_empty() && self.open.is_empty()
    }

    pub fn clear(&mut self) {
        self.qcm.clear();
        self.open.clear();
    }
}

/// Multiple-choice question as presented to a learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerQcmQuestion {
    pub question: String,
    pub options: Vec<String>,
}

impl From<&QcmQuestion> for LearnerQcmQuestion {
    fn from(value: &QcmQuestion) -> Self {
        Self {
            question: value.question.clone(),
            options: value.options.clone(),
        }
    }
}

/// Open question as presented to a learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerOpenQuestion {
    pub question: String,
}

impl From<&OpenQuestion> for LearnerOpenQuestion {
    fn from(value: &OpenQuestion) -> Self {
        Self {
            question: value.question.clone(),
        }
    }
}

/// Quiz stripped of every answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerQuiz {
    pub id: QuizId,
    pub quiz_type: QuizType,
    pub qcm: Vec<LearnerQcmQuestion>,
    pub open: Vec<LearnerOpenQuestion>,
}

impl From<&Quiz> for LearnerQuiz {
    fn from(value: &Quiz) -> Self {
        Self {
            id: value.id,
            quiz_type: value.quiz_type,
            qcm: value.questions.qcm.iter().map(Into::into).collect(),
            open: value.questions.open.iter().map(Into::into).collect(),
        }
    }
}
