//! Timed certification exam handlers.
//!
//! ```text
//! GET  /api/v1/courses/python/certification
//! POST /api/v1/courses/python/certification/start
//! PUT  /api/v1/courses/python/certification/answer {"kind":"qcm","option":2}
//! POST /api/v1/courses/python/certification/next
//! POST /api/v1/courses/python/certification/previous
//! POST /api/v1/courses/python/certification/submit
//! POST /api/v1/courses/python/certification/retry
//! ```
//!
//! Each route returns the resulting [`ExamView`]. Actions that land after the
//! deadline return the timed-out result rather than an error.

use actix_web::{get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::ExamRequest;
use crate::domain::{Error, ExamAnswer, ExamView};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ExamViewSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Answer to the question currently on screen.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum AnswerRequest {
    /// Zero-based option index for a multiple-choice question.
    Qcm { option: usize },
    /// Free text for an open question.
    Open { text: String },
}

impl From<AnswerRequest> for ExamAnswer {
    fn from(value: AnswerRequest) -> Self {
        match value {
            AnswerRequest::Qcm { option } => Self::Qcm { option },
            AnswerRequest::Open { text } => Self::Open { text },
        }
    }
}

fn exam_request(session: &SessionContext, path: web::Path<String>) -> ApiResult<ExamRequest> {
    let user_id = session.require_user_id()?;
    Ok(ExamRequest::new(user_id, path.into_inner()))
}

/// Current state of the learner's exam for this course.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{slug}/certification",
    params(("slug" = String, Path, description = "Course slug")),
    responses(
        (status = 200, description = "Exam view", body = ExamViewSchema),
        (status = 401, description = "Login required", body = Error),
        (status = 404, description = "Unknown course", body = Error)
    ),
    tags = ["certification"],
    operation_id = "viewExam"
)]
#[get("/courses/{slug}/certification")]
pub async fn view_exam(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ExamView>> {
    let request = exam_request(&session, path)?;
    Ok(web::Json(state.exams.view(&request).await?))
}

/// Start the one-hour exam. Requires every module to be completed.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{slug}/certification/start",
    params(("slug" = String, Path, description = "Course slug")),
    responses(
        (status = 200, description = "Exam started on the first question", body = ExamViewSchema),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Course not yet completed", body = Error),
        (status = 404, description = "Unknown course", body = Error),
        (status = 409, description = "Exam already running", body = Error)
    ),
    tags = ["certification"],
    operation_id = "startExam"
)]
#[post("/courses/{slug}/certification/start")]
pub async fn start_exam(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ExamView>> {
    let request = exam_request(&session, path)?;
    Ok(web::Json(state.exams.start(&request).await?))
}

/// Record the answer to the current question, replacing any earlier one.
#[utoipa::path(
    put,
    path = "/api/v1/courses/{slug}/certification/answer",
    params(("slug" = String, Path, description = "Course slug")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = ExamViewSchema),
        (status = 400, description = "Answer does not fit the question", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 409, description = "Exam not in progress", body = Error)
    ),
    tags = ["certification"],
    operation_id = "answerExamQuestion"
)]
#[put("/courses/{slug}/certification/answer")]
pub async fn answer_question(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<AnswerRequest>,
) -> ApiResult<web::Json<ExamView>> {
    let request = exam_request(&session, path)?;
    let answer = ExamAnswer::from(payload.into_inner());
    Ok(web::Json(state.exams.answer(&request, answer).await?))
}

/// Move to the next question, crossing from the QCM block into open questions.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{slug}/certification/next",
    params(("slug" = String, Path, description = "Course slug")),
    responses(
        (status = 200, description = "Moved forward", body = ExamViewSchema),
        (status = 401, description = "Login required", body = Error),
        (status = 409, description = "Already at the last question", body = Error)
    ),
    tags = ["certification"],
    operation_id = "nextExamQuestion"
)]
#[post("/courses/{slug}/certification/next")]
pub async fn next_question(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ExamView>> {
    let request = exam_request(&session, path)?;
    Ok(web::Json(state.exams.next(&request).await?))
}

/// Move back one question.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{slug}/certification/previous",
    params(("slug" = String, Path, description = "Course slug")),
    responses(
        (status = 200, description = "Moved back", body = ExamViewSchema),
        (status = 401, description = "Login required", body = Error),
        (status = 409, description = "Already at the first question", body = Error)
    ),
    tags = ["certification"],
    operation_id = "previousExamQuestion"
)]
#[post("/courses/{slug}/certification/previous")]
pub async fn previous_question(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ExamView>> {
    let request = exam_request(&session, path)?;
    Ok(web::Json(state.exams.previous(&request).await?))
}

/// Submit from the final question. Passing issues a certificate.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{slug}/certification/submit",
    params(("slug" = String, Path, description = "Course slug")),
    responses(
        (status = 200, description = "Graded result", body = ExamViewSchema),
        (status = 401, description = "Login required", body = Error),
        (status = 409, description = "Not at the final question", body = Error),
        (
            status = 503,
            description = "Grading or issuance failed; the exam returns to its intro",
            body = Error
        )
    ),
    tags = ["certification"],
    operation_id = "submitExam"
)]
#[post("/courses/{slug}/certification/submit")]
pub async fn submit_exam(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ExamView>> {
    let request = exam_request(&session, path)?;
    Ok(web::Json(state.exams.submit(&request).await?))
}

/// Reset the exam to its intro, abandoning any running attempt.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{slug}/certification/retry",
    params(("slug" = String, Path, description = "Course slug")),
    responses(
        (status = 200, description = "Back at the intro", body = ExamViewSchema),
        (status = 401, description = "Login required", body = Error),
        (status = 409, description = "Exam is being graded", body = Error)
    ),
    tags = ["certification"],
    operation_id = "retryExam"
)]
#[post("/courses/{slug}/certification/retry")]
pub async fn retry_exam(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ExamView>> {
    let request = exam_request(&session, path)?;
    Ok(web::Json(state.exams.retry(&request).await?))
}

#[cfg(test)]
#[path = "certification_tests.rs"]
mod tests;
