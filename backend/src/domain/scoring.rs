//! Grading and scoring policy.
//!
//! Multiple-choice answers are graded locally by exact index match. Open
//! answers go to the [`AnswerGrader`] port in one batch; any failure there
//! falls back to a fixed partial credit so grading never blocks a learner.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ports::{AnswerGrader, GradingItem, OPEN_POINTS_PER_QUESTION};
use super::{Answers, CourseId, ModuleId, OpenQuestion, QcmQuestion, QuizId, QuizType, UserId};

/// Points credited per open question when grading is unavailable.
pub const OPEN_FALLBACK_POINTS: u32 = 3;
/// Weight of the multiple-choice percentage in a certification, in tenths.
pub const QCM_WEIGHT_TENTHS: u32 = 7;
/// Weight of the open-question percentage in a certification, in tenths.
pub const OPEN_WEIGHT_TENTHS: u32 = 3;
/// Inclusive pass mark for module quizzes.
pub const MODULE_PASS_MARK: f64 = 60.0;
/// Inclusive pass mark for certifications.
pub const CERTIFICATION_PASS_MARK: f64 = 80.0;
/// Scores are percentages.
pub const MAX_SCORE: i32 = 100;

/// Outcome of grading multiple-choice answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QcmGrade {
    pub score: u32,
    pub total: u32,
    /// Per-question correctness, parallel to the questions.
    pub correct: Vec<bool>,
}

/// Grade multiple-choice answers by exact match. Missing answers are wrong.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use skillflash::domain::{grade_qcm, QcmQuestion};
///
/// let q = QcmQuestion::new("2 + 2?", vec!["3".into(), "4".into()], 1).unwrap();
/// let answers = BTreeMap::from([(0, 1)]);
/// assert_eq!(grade_qcm(&[q], &answers).score, 1);
/// ```
pub fn grade_qcm(questions: &[QcmQuestion], answers: &BTreeMap<usize, usize>) -> QcmGrade {
    let correct: Vec<bool> = questions
        .iter()
        .enumerate()
        .map(|(index, question)| answers.get(&index) == Some(&question.correct()))
        .collect();
    QcmGrade {
        score: count_u32(correct.iter().filter(|hit| **hit).count()),
        total: count_u32(questions.len()),
        correct,
    }
}

/// Outcome of grading open answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenGrade {
    pub score: u32,
    /// Maximum attainable points: five per question.
    pub total: u32,
    /// Whether the fixed partial credit replaced real grading.
    pub fallback: bool,
}

impl OpenGrade {
    /// Grade for an empty batch.
    pub const fn empty() -> Self {
        Self {
            score: 0,
            total: 0,
            fallback: false,
        }
    }

    /// Fixed partial credit for `count` questions.
    pub fn fallback(count: usize) -> Self {
        let count = count_u32(count);
        Self {
            score: count.saturating_mul(OPEN_FALLBACK_POINTS),
            total: count.saturating_mul(OPEN_POINTS_PER_QUESTION),
            fallback: true,
        }
    }

    /// Accept grader scores only when they match the batch exactly.
    pub fn from_scores(scores: &[u32], count: usize) -> Option<Self> {
        let well_formed = scores.len() == count
            && scores.iter().all(|score| *score <= OPEN_POINTS_PER_QUESTION);
        well_formed.then(|| Self {
            score: scores.iter().sum(),
            total: count_u32(count).saturating_mul(OPEN_POINTS_PER_QUESTION),
            fallback: false,
        })
    }
}

/// Grade open answers through the external grader, falling back to
/// [`OPEN_FALLBACK_POINTS`] per question on any failure or malformed reply.
pub async fn grade_open(
    grader: &dyn AnswerGrader,
    questions: &[OpenQuestion],
    answers: &BTreeMap<usize, String>,
) -> OpenGrade {
    if questions.is_empty() {
        return OpenGrade::empty();
    }
    let items: Vec<GradingItem> = questions
        .iter()
        .enumerate()
        .map(|(index, question)| GradingItem {
            question: question.question.clone(),
            expected_answer: question.expected_answer.clone(),
            learner_answer: answers
                .get(&index)
                .filter(|answer| !answer.trim().is_empty())
                .cloned(),
        })
        .collect();

    match grader.grade(&items).await {
        Ok(scores) => OpenGrade::from_scores(&scores, items.len()).unwrap_or_else(|| {
            warn!(
                expected = items.len(),
                received = scores.len(),
                "grader returned malformed scores; applying fallback"
            );
            OpenGrade::fallback(items.len())
        }),
        Err(error) => {
            warn!(%error, questions = items.len(), "open answer grading failed; applying fallback");
            OpenGrade::fallback(items.len())
        }
    }
}

/// Percentage of `score` over `total`, or zero for an empty total.
pub fn percent(score: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(score) * 100.0 / f64::from(total)
}

/// Weighted composite score for a quiz type.
///
/// Module quizzes score on multiple-choice answers only. Certifications
/// blend 70% multiple-choice with 30% open answers.
///
/// # Examples
/// ```
/// use skillflash::domain::{composite, QuizType};
///
/// assert_eq!(composite(QuizType::Certification, 100.0, 0.0), 70.0);
/// assert_eq!(composite(QuizType::Certification, 0.0, 100.0), 30.0);
/// assert_eq!(composite(QuizType::Module, 55.0, 100.0), 55.0);
/// ```
pub fn composite(quiz_type: QuizType, qcm_percent: f64, open_percent: f64) -> f64 {
    match quiz_type {
        QuizType::Module => qcm_percent,
        QuizType::Certification => {
            (f64::from(QCM_WEIGHT_TENTHS) * qcm_percent
                + f64::from(OPEN_WEIGHT_TENTHS) * open_percent)
                / 10.0
        }
    }
}

pub fn pass_mark(quiz_type: QuizType) -> f64 {
    match quiz_type {
        QuizType::Module => MODULE_PASS_MARK,
        QuizType::Certification => CERTIFICATION_PASS_MARK,
    }
}

/// Whether `score` reaches the inclusive pass mark of `quiz_type`.
pub fn passes(quiz_type: QuizType, score: f64) -> bool {
    score >= pass_mark(quiz_type)
}

/// Scored attempt summary returned to learners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    pub score: f64,
    pub qcm_score: u32,
    pub qcm_total: u32,
    pub open_score: u32,
    pub open_total: u32,
    pub qcm_percent: f64,
    pub open_percent: f64,
    pub passed: bool,
    /// True when open answers received the fixed partial credit.
    pub open_fallback: bool,
}

impl Scorecard {
    pub fn compute(quiz_type: QuizType, qcm: &QcmGrade, open: &OpenGrade) -> Self {
        let qcm_percent = percent(qcm.score, qcm.total);
        let open_percent = percent(open.score, open.total);
        let score = composite(quiz_type, qcm_percent, open_percent);
        Self {
            score,
            qcm_score: qcm.score,
            qcm_total: qcm.total,
            open_score: open.score,
            open_total: open.total,
            qcm_percent,
            open_percent,
            passed: passes(quiz_type, score),
            open_fallback: open.fallback,
        }
    }
}

/// A graded attempt ready to be appended to the results log.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttempt {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub module_id: Option<ModuleId>,
    pub course_id: Option<CourseId>,
    pub score: f64,
    pub max_score: i32,
    pub answers: Answers,
    pub completed_at: DateTime<Utc>,
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
