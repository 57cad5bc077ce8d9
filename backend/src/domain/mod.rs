//! Domain primitives, aggregates, and services.
//!
//! Purpose: hold the learning rules (module unlocking, scoring, the timed
//! certification exam, certificates, and badges) independent of HTTP and
//! storage. Services depend on the traits in [`ports`] only.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - [`ExamSession`]: the owned state machine of one certification attempt.
//! - [`ScoringService`], [`ProgressTracker`], [`BadgeAwarder`], and
//!   [`CertificateIssuer`]: the grading and reward pipeline.

pub mod auth;
mod badges;
mod catalogue_service;
mod certificate;
mod course;
pub mod error;
pub mod exam;
mod module_content_service;
pub(crate) mod port_error_mapping;
pub mod ports;
mod profile;
mod profile_service;
mod progress;
mod quiz;
mod scoring;
mod scoring_service;
pub mod trace_id;
pub mod user;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::badges::{
    BADGE_POINTS, BadgeAwarder, LearnerStats, STREAK_DAYS, current_streak, qualifying_badges,
};
pub use self::catalogue_service::CatalogueService;
pub use self::certificate::{
    CERTIFICATE_BONUS_POINTS, CODE_PREFIX, Certificate, CertificateIssuer, InvalidVerificationCode,
    IssuedCertificate, MAX_CODE_ATTEMPTS, NewCertificate, VerificationCode, VerifiedCertificate,
};
pub use self::course::{
    Course, CourseId, CourseLevel, CourseValidationError, MODULE_COUNT, Module, ModuleContent,
    ModuleExample, ModuleExercise, ModuleId, ModuleNumber,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::exam::{
    CurrentQuestion, EXAM_DURATION_SECS, ExamAnswer, ExamError, ExamOutcome, ExamPhase,
    ExamService, ExamServicePorts, ExamSession, ExamStatus, ExamView, FINISHED_RETENTION_SECS,
    SubmittedExam, spawn_exam_sweeper,
};
pub use self::module_content_service::{
    GeneratedContentError, ModuleContentService, validate_generated,
};
pub use self::profile::{Badge, DEFAULT_DISPLAY_NAME, LeaderboardEntry, Profile, UnknownBadge};
pub use self::profile_service::ProfileService;
pub use self::progress::{
    CompletionOutcome, CompletionWrite, MODULE_COMPLETION_POINTS, ModuleCompletion, ModuleSlot,
    ProgressTracker, derive_unlock_state, is_course_complete, is_unlocked,
};
pub use self::quiz::{
    Answers, LearnerOpenQuestion, LearnerQcmQuestion, LearnerQuiz, OpenQuestion, QcmQuestion,
    QuestionSet, Quiz, QuizId, QuizType, QuizValidationError,
};
pub use self::scoring::{
    CERTIFICATION_PASS_MARK, MAX_SCORE, MODULE_PASS_MARK, NewAttempt, OPEN_FALLBACK_POINTS,
    OPEN_WEIGHT_TENTHS, OpenGrade, QCM_WEIGHT_TENTHS, QcmGrade, Scorecard, composite, grade_open,
    grade_qcm, pass_mark, passes, percent,
};
pub use self::scoring_service::ScoringService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use skillflash::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
