//! Public certificate verification.
//!
//! ```text
//! GET /api/v1/certificates/SF-PYTHON-LZ4K2M1Q
//! ```

use actix_web::{get, web};

use crate::domain::{Error, VerifiedCertificate};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::VerifiedCertificateSchema;
use crate::inbound::http::state::HttpState;

/// Resolve a verification code. Codes are matched case-insensitively.
#[utoipa::path(
    get,
    path = "/api/v1/certificates/{code}",
    params(("code" = String, Path, description = "Verification code printed on the certificate")),
    responses(
        (status = 200, description = "Certificate is genuine", body = VerifiedCertificateSchema),
        (status = 400, description = "Malformed code", body = Error),
        (status = 404, description = "No certificate has this code", body = Error)
    ),
    tags = ["certificates"],
    operation_id = "verifyCertificate",
    security([])
)]
#[get("/certificates/{code}")]
pub async fn verify_certificate(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<VerifiedCertificate>> {
    let code = path.into_inner();
    let certificate = state.certificates.verify(&code).await?;
    Ok(web::Json(certificate))
}
