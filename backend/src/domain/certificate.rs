//! Certificates: verification codes, issuance, and public verification.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::port_error_mapping::map_certificate_error;
use super::ports::{
    CertificateRepository, CertificateRepositoryError, CertificateVerification, ProfileRepository,
};
use super::{Badge, BadgeAwarder, CERTIFICATION_PASS_MARK, Course, CourseId, Error, UserId};

/// Points credited with every certificate.
pub const CERTIFICATE_BONUS_POINTS: i64 = 100;
/// Prefix shared by every verification code.
pub const CODE_PREFIX: &str = "SF";
/// Insert attempts before giving up on a colliding verification code.
pub const MAX_CODE_ATTEMPTS: usize = 3;
const RETRY_SUFFIX_LEN: usize = 4;

/// Public, shareable certificate identifier such as `SF-RUST-101-M3X9K2QZ`.
///
/// Codes are stored and compared in upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VerificationCode(String);

/// Raised when a verification code is blank or contains whitespace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("verification code must be a non-empty token without whitespace")]
pub struct InvalidVerificationCode;

impl VerificationCode {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, InvalidVerificationCode> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(InvalidVerificationCode);
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Build a code from the course slug and the issue instant, optionally
    /// followed by a retry suffix.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use skillflash::domain::VerificationCode;
    ///
    /// let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
    /// let code = VerificationCode::generate("rust-basics", at, None);
    /// assert_eq!(code.as_str(), "SF-RUST-BASICS-LOYW3V28");
    /// ```
    pub fn generate(course_slug: &str, issued_at: DateTime<Utc>, suffix: Option<&str>) -> Self {
        let stamp = to_base36(u64::try_from(issued_at.timestamp_millis()).unwrap_or_default());
        let mut code = format!("{CODE_PREFIX}-{}-{stamp}", course_slug.trim());
        if let Some(suffix) = suffix {
            code.push('-');
            code.push_str(suffix);
        }
        Self(code.to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VerificationCode {
    type Error = InvalidVerificationCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VerificationCode> for String {
    fn from(value: VerificationCode) -> Self {
        value.0
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    loop {
        let digit = usize::try_from(value % 36).unwrap_or_default();
        out.push(char::from(DIGITS.get(digit).copied().unwrap_or(b'0')));
        value /= 36;
        if value == 0 {
            break;
        }
    }
    out.iter().rev().collect()
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RETRY_SUFFIX_LEN)
        .map(char::from)
        .collect::<String>()
        .to_ascii_uppercase()
}

/// A stored certificate. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub score: f64,
    pub verification_code: VerificationCode,
    pub created_at: DateTime<Utc>,
}

/// Certificate about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCertificate {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub score: f64,
    pub verification_code: VerificationCode,
    pub created_at: DateTime<Utc>,
}

/// Public view returned by verification lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedCertificate {
    pub holder_name: String,
    pub course_title: String,
    pub score: f64,
    pub issued_at: DateTime<Utc>,
    pub verification_code: VerificationCode,
}

/// Outcome of a successful issuance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCertificate {
    pub certificate: Certificate,
    pub verification_code: VerificationCode,
    pub verification_url: String,
    pub new_badges: Vec<Badge>,
}

/// Mints certificates for passing certification scores and serves public
/// verification lookups.
pub struct CertificateIssuer {
    certificates: Arc<dyn CertificateRepository>,
    profiles: Arc<dyn ProfileRepository>,
    awarder: Arc<BadgeAwarder>,
    clock: Arc<dyn Clock>,
    public_base_url: String,
}

impl CertificateIssuer {
    pub fn new(
        certificates: Arc<dyn CertificateRepository>,
        profiles: Arc<dyn ProfileRepository>,
        awarder: Arc<BadgeAwarder>,
        clock: Arc<dyn Clock>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            certificates,
            profiles,
            awarder,
            clock,
            public_base_url: public_base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Public URL resolving `code`.
    pub fn verification_url(&self, code: &VerificationCode) -> String {
        format!("{}/verify/{code}", self.public_base_url)
    }

    /// Issue a certificate for a passing certification `score`.
    ///
    /// Inserts the certificate, credits [`CERTIFICATE_BONUS_POINTS`], and
    /// adds [`Badge::Certified`] unless already held. A colliding
    /// verification code is retried with a random suffix. Once the
    /// certificate is stored, reward failures are logged and do not fail
    /// the issuance.
    pub async fn issue(
        &self,
        user_id: &UserId,
        course: &Course,
        score: f64,
    ) -> Result<IssuedCertificate, Error> {
        if !(score >= CERTIFICATION_PASS_MARK) {
            return Err(Error::forbidden(format!(
                "a certificate requires at least {CERTIFICATION_PASS_MARK}%, got {score:.1}%"
            )));
        }

        let certificate = self.insert_with_unique_code(user_id, course, score).await?;

        // The stored certificate stands even when the rewards below fail.
        if let Err(error) = self
            .profiles
            .add_points(user_id, CERTIFICATE_BONUS_POINTS)
            .await
        {
            warn!(%error, user_id = %user_id, "certificate bonus points were not credited");
        }
        let mut new_badges = match self
            .profiles
            .grant_badges(user_id, &[Badge::Certified], 0)
            .await
        {
            Ok(badges) => badges,
            Err(error) => {
                warn!(%error, user_id = %user_id, "certified badge was not granted");
                Vec::new()
            }
        };
        match self.awarder.evaluate(user_id).await {
            Ok(badges) => new_badges.extend(badges),
            Err(error) => {
                warn!(%error, user_id = %user_id, "badge evaluation failed after certification");
            }
        }

        info!(
            user_id = %user_id,
            course = %course.slug,
            score,
            code = %certificate.verification_code,
            "certificate issued"
        );
        let verification_url = self.verification_url(&certificate.verification_code);
        Ok(IssuedCertificate {
            verification_code: certificate.verification_code.clone(),
            certificate,
            verification_url,
            new_badges,
        })
    }

    async fn insert_with_unique_code(
        &self,
        user_id: &UserId,
        course: &Course,
        score: f64,
    ) -> Result<Certificate, Error> {
        let created_at = self.clock.utc();
        let mut last_error = None;
        for attempt in 0..MAX_CODE_ATTEMPTS {
            let suffix = (attempt > 0).then(random_suffix);
            let candidate = NewCertificate {
                user_id: user_id.clone(),
                course_id: course.id,
                score,
                verification_code: VerificationCode::generate(
                    &course.slug,
                    created_at,
                    suffix.as_deref(),
                ),
                created_at,
            };
            match self.certificates.insert(&candidate).await {
                Ok(certificate) => return Ok(certificate),
                Err(CertificateRepositoryError::DuplicateCode { code }) => {
                    warn!(%code, attempt, "verification code collision; retrying");
                    last_error = Some(CertificateRepositoryError::DuplicateCode { code });
                }
                Err(other) => return Err(map_certificate_error(other)),
            }
        }
        Err(last_error.map_or_else(
            || Error::internal("certificate could not be issued"),
            map_certificate_error,
        ))
    }
}

#[async_trait]
impl CertificateVerification for CertificateIssuer {
    async fn verify(&self, code: &str) -> Result<VerifiedCertificate, Error> {
        let code = VerificationCode::new(code)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.certificates
            .find_by_code(&code)
            .await
            .map_err(map_certificate_error)?
            .ok_or_else(|| Error::not_found(format!("no certificate matches code {code}")))
    }
}

#[cfg(test)]
#[path = "certificate_tests.rs"]
mod tests;
