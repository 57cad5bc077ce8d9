//! Port for certificate persistence and public lookups.

use async_trait::async_trait;

use crate::domain::{Certificate, NewCertificate, UserId, VerificationCode, VerifiedCertificate};

use super::define_port_error;

define_port_error! {
    /// Errors raised by certificate repository adapters.
    pub enum CertificateRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "certificate repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "certificate repository query failed: {message}",
        /// Another certificate already uses the verification code.
        DuplicateCode { code: String } => "verification code already issued: {code}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateRepository: Send + Sync {
    async fn insert(
        &self,
        certificate: &NewCertificate,
    ) -> Result<Certificate, CertificateRepositoryError>;

    /// Certificate joined with its course title and holder name.
    async fn find_by_code(
        &self,
        code: &VerificationCode,
    ) -> Result<Option<VerifiedCertificate>, CertificateRepositoryError>;

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Certificate>, CertificateRepositoryError>;
}

/// Fixture implementation with no stored certificates.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCertificateRepository;

#[async_trait]
impl CertificateRepository for FixtureCertificateRepository {
    async fn insert(
        &self,
        _certificate: &NewCertificate,
    ) -> Result<Certificate, CertificateRepositoryError> {
        Err(CertificateRepositoryError::query(
            "fixture repository does not store certificates",
        ))
    }

    async fn find_by_code(
        &self,
        _code: &VerificationCode,
    ) -> Result<Option<VerifiedCertificate>, CertificateRepositoryError> {
        Ok(None)
    }

    async fn list_for_user(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<Certificate>, CertificateRepositoryError> {
        Ok(Vec::new())
    }
}
