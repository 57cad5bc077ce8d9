//! Translations from port errors into domain [`Error`] values.
//!
//! Connection failures become `service_unavailable` so clients may retry;
//! query failures become `internal_error` and are redacted at the edge.

use super::Error;
use super::ports::{
    AiProviderError, CertificateRepositoryError, CourseRepositoryError, ModuleRepositoryError,
    ProfileRepositoryError, ProgressRepositoryError, QuizRepositoryError, ResultRepositoryError,
};

macro_rules! map_repository_error {
    ($fn_name:ident, $error:ident, $label:literal) => {
        pub(crate) fn $fn_name(error: $error) -> Error {
            match error {
                $error::Connection { message } => {
                    Error::service_unavailable(format!(
                        concat!($label, " unavailable: {}"),
                        message
                    ))
                }
                $error::Query { message } => {
                    Error::internal(format!(concat!($label, " error: {}"), message))
                }
            }
        }
    };
}

map_repository_error!(map_course_error, CourseRepositoryError, "course repository");
map_repository_error!(map_module_error, ModuleRepositoryError, "module repository");
map_repository_error!(map_quiz_error, QuizRepositoryError, "quiz repository");
map_repository_error!(map_progress_error, ProgressRepositoryError, "progress repository");
map_repository_error!(map_result_error, ResultRepositoryError, "result repository");
map_repository_error!(map_profile_error, ProfileRepositoryError, "profile repository");

pub(crate) fn map_certificate_error(error: CertificateRepositoryError) -> Error {
    match error {
        CertificateRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("certificate repository unavailable: {message}"))
        }
        CertificateRepositoryError::Query { message } => {
            Error::internal(format!("certificate repository error: {message}"))
        }
        CertificateRepositoryError::DuplicateCode { code } => {
            Error::conflict(format!("verification code {code} is already in use"))
        }
    }
}

/// Map content generation failures to learner-facing errors. Rate limits and
/// exhausted credits stay distinct because they call for different remedies.
pub(crate) fn map_generation_error(error: AiProviderError) -> Error {
    match error {
        AiProviderError::RateLimited => {
            Error::rate_limited("Too many requests. Please wait a moment and try again.")
        }
        AiProviderError::QuotaExceeded => {
            Error::quota_exceeded("Insufficient AI credits to generate this module.")
        }
        AiProviderError::NotConfigured => {
            Error::service_unavailable("Module generation is not available right now.")
        }
        AiProviderError::Transport { .. }
        | AiProviderError::Upstream { .. }
        | AiProviderError::Decode { .. } => {
            Error::service_unavailable("Module generation failed. Please try again.")
        }
    }
}
