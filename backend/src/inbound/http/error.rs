//! Domain errors rendered as JSON responses.
//!
//! Status codes follow [`ErrorCode`]. Internal errors are replaced with a
//! generic message before leaving the process, the `trace-id` header echoes
//! the request trace, and provider throttling carries a `Retry-After` hint.

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, ResponseError};
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Handler result carrying a domain [`Error`].
pub type ApiResult<T> = Result<T, Error>;

/// Seconds a client should wait before retrying a throttled request.
pub const RETRY_AFTER_SECS: u32 = 10;

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.code() {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let Some(trace_id) = self.trace_id() {
            response.insert_header((TRACE_ID_HEADER, trace_id.to_owned()));
        }
        if self.code() == ErrorCode::RateLimited {
            response.insert_header((header::RETRY_AFTER, RETRY_AFTER_SECS));
        }
        response.json(public_payload(self))
    }
}

/// The body a client sees: internal details never leave the process.
fn public_payload(err: &Error) -> Error {
    if err.code() != ErrorCode::InternalError {
        return err.clone();
    }
    let redacted = Error::internal("Internal server error");
    match err.trace_id() {
        Some(trace_id) => redacted.with_trace_id(trace_id.to_owned()),
        None => redacted,
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "framework error surfaced as internal error");
        Error::internal("Internal server error")
    }
}

#[cfg(test)]
mod tests;
