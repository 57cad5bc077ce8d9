//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, the AI provider, the notifier) are
//! implemented by outbound adapters. Driving ports (queries and use cases)
//! are implemented by domain services and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod ai_provider;
mod answer_grader;
mod catalogue_query;
mod certificate_notifier;
mod certificate_repository;
mod certificate_verification;
mod certification_exam;
mod content_generator;
mod course_repository;
mod login_service;
mod module_content_query;
mod module_repository;
mod profile_query;
mod profile_repository;
mod progress_repository;
mod quiz_evaluation;
mod quiz_repository;
mod result_repository;

pub use ai_provider::AiProviderError;
#[cfg(test)]
pub use answer_grader::MockAnswerGrader;
pub use answer_grader::{AnswerGrader, FixtureAnswerGrader, GradingItem, OPEN_POINTS_PER_QUESTION};
#[cfg(test)]
pub use catalogue_query::MockCatalogueQuery;
pub use catalogue_query::{CatalogueQuery, CourseProgressView, FixtureCatalogueQuery};
#[cfg(test)]
pub use certificate_notifier::MockCertificateNotifier;
pub use certificate_notifier::{
    CertificateNotice, CertificateNotifier, CertificateNotifierError, FixtureCertificateNotifier,
};
#[cfg(test)]
pub use certificate_repository::MockCertificateRepository;
pub use certificate_repository::{
    CertificateRepository, CertificateRepositoryError, FixtureCertificateRepository,
};
#[cfg(test)]
pub use certificate_verification::MockCertificateVerification;
pub use certificate_verification::{CertificateVerification, FixtureCertificateVerification};
#[cfg(test)]
pub use certification_exam::MockCertificationExam;
pub use certification_exam::{CertificationExam, ExamRequest, FixtureCertificationExam};
#[cfg(test)]
pub use content_generator::MockContentGenerator;
pub use content_generator::{
    ContentGenerator, FixtureContentGenerator, GENERATED_OPEN_COUNT, GENERATED_QCM_COUNT,
    GeneratedModule, GenerationRequest,
};
#[cfg(test)]
pub use course_repository::MockCourseRepository;
pub use course_repository::{CourseRepository, CourseRepositoryError, FixtureCourseRepository};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::{DEMO_LEARNERS, FixtureLoginService, LoginService};
#[cfg(test)]
pub use module_content_query::MockModuleContentQuery;
pub use module_content_query::{
    FixtureModuleContentQuery, ModuleContentQuery, ModuleRequest, ModuleView,
};
#[cfg(test)]
pub use module_repository::MockModuleRepository;
pub use module_repository::{
    FixtureModuleRepository, GeneratedModuleRecord, ModuleRepository, ModuleRepositoryError,
};
#[cfg(test)]
pub use profile_query::MockProfileQuery;
pub use profile_query::{
    DEFAULT_LEADERBOARD_SIZE, FixtureProfileQuery, MAX_LEADERBOARD_SIZE, ProfileQuery,
};
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::{FixtureProfileRepository, ProfileRepository, ProfileRepositoryError};
#[cfg(test)]
pub use progress_repository::MockProgressRepository;
pub use progress_repository::{
    FixtureProgressRepository, ProgressRepository, ProgressRepositoryError,
};
#[cfg(test)]
pub use quiz_evaluation::MockQuizEvaluation;
pub use quiz_evaluation::{
    EvaluateQuizRequest, FixtureQuizEvaluation, QcmReview, QuizAttemptResponse, QuizEvaluation,
};
#[cfg(test)]
pub use quiz_repository::MockQuizRepository;
pub use quiz_repository::{FixtureQuizRepository, QuizRepository, QuizRepositoryError};
#[cfg(test)]
pub use result_repository::MockResultRepository;
pub use result_repository::{FixtureResultRepository, ResultRepository, ResultRepositoryError};
