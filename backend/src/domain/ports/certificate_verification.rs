//! Driving port for public certificate verification.

use async_trait::async_trait;

use crate::domain::{Error, VerifiedCertificate};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateVerification: Send + Sync {
    /// Resolve a verification code. Requires no authentication.
    async fn verify(&self, code: &str) -> Result<VerifiedCertificate, Error>;
}

/// Fixture implementation that knows no certificates.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCertificateVerification;

#[async_trait]
impl CertificateVerification for FixtureCertificateVerification {
    async fn verify(&self, code: &str) -> Result<VerifiedCertificate, Error> {
        Err(Error::not_found(format!("no certificate matches code {code}")))
    }
}
