//! PostgreSQL-backed `CertificateRepository`.
//!
//! A unique violation on the verification code is reported as
//! `DuplicateCode` so the issuer can retry with a fresh suffix.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{CertificateRepository, CertificateRepositoryError};
use crate::domain::{
    Certificate, DEFAULT_DISPLAY_NAME, NewCertificate, UserId, VerificationCode,
    VerifiedCertificate,
};

use super::error_mapping::{
    DieselFailure, classify_diesel_error, map_diesel_error, map_pool_error, map_row_error,
};
use super::models::{CertificateRow, NewCertificateRow};
use super::pool::DbPool;
use super::schema::{certificates, courses, profiles};

const VERIFICATION_CODE_CONSTRAINT: &str = "certificates_verification_code_key";

#[derive(Clone)]
pub struct DieselCertificateRepository {
    pool: DbPool,
}

impl DieselCertificateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(
    error: diesel::result::Error,
    code: &VerificationCode,
) -> CertificateRepositoryError {
    match classify_diesel_error(&error) {
        DieselFailure::UniqueViolation { constraint }
            if constraint
                .as_deref()
                .is_none_or(|name| name == VERIFICATION_CODE_CONSTRAINT) =>
        {
            CertificateRepositoryError::duplicate_code(code.as_str())
        }
        _ => map_diesel_error(error),
    }
}

#[async_trait]
impl CertificateRepository for DieselCertificateRepository {
    async fn insert(
        &self,
        certificate: &NewCertificate,
    ) -> Result<Certificate, CertificateRepositoryError> {
        let row = NewCertificateRow {
            id: Uuid::new_v4(),
            user_id: *certificate.user_id.as_uuid(),
            course_id: *certificate.course_id.as_uuid(),
            score: certificate.score,
            verification_code: certificate.verification_code.as_str(),
            created_at: certificate.created_at,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let stored: CertificateRow = diesel::insert_into(certificates::table)
            .values(&row)
            .returning(CertificateRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_insert_error(err, &certificate.verification_code))?;
        Certificate::try_from(stored).map_err(map_row_error)
    }

    async fn find_by_code(
        &self,
        code: &VerificationCode,
    ) -> Result<Option<VerifiedCertificate>, CertificateRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(CertificateRow, String, Option<String>)> = certificates::table
            .inner_join(courses::table)
            .left_join(profiles::table.on(profiles::user_id.eq(certificates::user_id)))
            .filter(certificates::verification_code.eq(code.as_str()))
            .select((
                CertificateRow::as_select(),
                courses::title,
                profiles::name.nullable(),
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|(certificate, course_title, holder)| {
            let certificate = Certificate::try_from(certificate).map_err(map_row_error)?;
            Ok(verified(certificate, course_title, holder))
        })
        .transpose()
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Certificate>, CertificateRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CertificateRow> = certificates::table
            .filter(certificates::user_id.eq(user_id.as_uuid()))
            .order_by(certificates::created_at.asc())
            .select(CertificateRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(Certificate::try_from)
            .collect::<Result<_, _>>()
            .map_err(map_row_error)
    }
}

fn verified(
    certificate: Certificate,
    course_title: String,
    holder_name: Option<String>,
) -> VerifiedCertificate {
    VerifiedCertificate {
        holder_name: holder_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_owned()),
        course_title,
        score: certificate.score,
        issued_at: certificate.created_at,
        verification_code: certificate.verification_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    struct Constraint(Option<&'static str>);

    impl DatabaseErrorInformation for Constraint {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("certificates")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            self.0
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn code() -> VerificationCode {
        VerificationCode::new("SF-RUST-BASICS-LOYW3V28").expect("valid code")
    }

    #[rstest]
    #[case(Some(VERIFICATION_CODE_CONSTRAINT))]
    #[case(None)]
    fn code_collisions_are_duplicate_codes(#[case] constraint: Option<&'static str>) {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(Constraint(constraint)),
        );
        assert_eq!(
            map_insert_error(error, &code()),
            CertificateRepositoryError::duplicate_code("SF-RUST-BASICS-LOYW3V28")
        );
    }

    #[rstest]
    fn other_unique_violations_are_query_errors() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(Constraint(Some("certificates_pkey"))),
        );
        assert!(matches!(
            map_insert_error(error, &code()),
            CertificateRepositoryError::Query { .. }
        ));
    }

    #[rstest]
    fn missing_profiles_verify_under_the_default_name() {
        let issued_at = Utc.with_ymd_and_hms(2026, 2, 24, 10, 30, 0).single().expect("valid");
        let certificate = Certificate {
            id: Uuid::nil(),
            user_id: UserId::from_uuid(Uuid::nil()),
            course_id: crate::domain::CourseId::from_uuid(Uuid::nil()),
            score: 92.5,
            verification_code: code(),
            created_at: issued_at,
        };
        let view = verified(certificate, "Rust Basics".to_owned(), None);
        assert_eq!(view.holder_name, "Learner");
        assert_eq!(view.issued_at, issued_at);
    }
}
