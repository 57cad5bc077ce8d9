//! Module quiz attempt handler.
//!
//! ```text
//! POST /api/v1/quizzes/{id}/attempts {"qcm":{"0":1,"1":3},"open":{"0":"..."}}
//! ```

use std::collections::BTreeMap;

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::ports::{EvaluateQuizRequest, QuizAttemptResponse};
use crate::domain::{Answers, Error, QuizId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::QuizAttemptSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Answers keyed by question index. Missing indices count as unanswered.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AttemptRequest {
    /// Question index to chosen option index.
    #[serde(default)]
    #[schema(example = json!({"0": 1, "1": 3}))]
    pub qcm: BTreeMap<usize, usize>,
    /// Question index to free-text answer.
    #[serde(default)]
    pub open: BTreeMap<usize, String>,
}

impl From<AttemptRequest> for Answers {
    fn from(value: AttemptRequest) -> Self {
        Self {
            qcm: value.qcm,
            open: value.open,
        }
    }
}

fn parse_quiz_id(raw: &str) -> Result<QuizId, Error> {
    Uuid::parse_str(raw).map(QuizId::from_uuid).map_err(|_| {
        Error::invalid_request("quiz id must be a UUID")
            .with_details(json!({ "field": "id", "value": raw }))
    })
}

/// Grade a module quiz attempt for the signed-in learner.
///
/// A passing first attempt completes the module, awards points, and may
/// grant badges; the response reveals the correct options.
#[utoipa::path(
    post,
    path = "/api/v1/quizzes/{id}/attempts",
    params(("id" = String, Path, description = "Quiz id")),
    request_body = AttemptRequest,
    responses(
        (status = 200, description = "Graded attempt", body = QuizAttemptSchema),
        (status = 400, description = "Malformed id or answers", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Module still locked", body = Error),
        (status = 404, description = "Unknown quiz", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["quizzes"],
    operation_id = "submitAttempt"
)]
#[post("/quizzes/{id}/attempts")]
pub async fn submit_attempt(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<AttemptRequest>,
) -> ApiResult<web::Json<QuizAttemptResponse>> {
    let user_id = session.require_user_id()?;
    let quiz_id = parse_quiz_id(&path.into_inner())?;
    let response = state
        .quizzes
        .evaluate(EvaluateQuizRequest {
            user_id,
            quiz_id,
            answers: payload.into_inner().into(),
        })
        .await?;
    Ok(web::Json(response))
}
