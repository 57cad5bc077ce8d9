//! Port for telling a learner their certificate is ready.

use async_trait::async_trait;

use crate::domain::{CourseId, UserId, VerificationCode};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notifier adapters.
    pub enum CertificateNotifierError {
        /// The notification could not be delivered.
        Delivery { message: String } => "certificate notification failed: {message}",
    }
}

/// Payload describing an issued certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateNotice {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub course_title: String,
    pub verification_code: VerificationCode,
    pub verification_url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateNotifier: Send + Sync {
    async fn certificate_issued(
        &self,
        notice: &CertificateNotice,
    ) -> Result<(), CertificateNotifierError>;
}

/// Fixture implementation that drops every notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCertificateNotifier;

#[async_trait]
impl CertificateNotifier for FixtureCertificateNotifier {
    async fn certificate_issued(
        &self,
        _notice: &CertificateNotice,
    ) -> Result<(), CertificateNotifierError> {
        Ok(())
    }
}
