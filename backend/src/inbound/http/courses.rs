//! Catalogue, course progress, and module content handlers.
//!
//! ```text
//! GET /api/v1/courses
//! GET /api/v1/courses/python/progress
//! GET /api/v1/courses/python/modules/3
//! ```
//!
//! Every route works anonymously. Signed-in learners additionally get their
//! unlock state, and locked modules answer `403`.

use actix_web::{get, web};
use serde_json::json;
use tracing::debug;

use crate::domain::ports::{CourseProgressView, ModuleRequest, ModuleView};
use crate::domain::{Course, Error, ModuleNumber};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{CourseProgressSchema, CourseSchema, ModuleViewSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// List the course catalogue ordered by title.
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    responses(
        (status = 200, description = "Course catalogue", body = [CourseSchema]),
        (status = 503, description = "Catalogue unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["courses"],
    operation_id = "listCourses",
    security([])
)]
#[get("/courses")]
pub async fn list_courses(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<Course>>> {
    let courses = state.catalogue.list_courses().await?;
    Ok(web::Json(courses))
}

/// Module unlock and completion state for one course.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{slug}/progress",
    params(("slug" = String, Path, description = "Course slug")),
    responses(
        (status = 200, description = "Course progress", body = CourseProgressSchema),
        (status = 404, description = "Unknown course", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["courses"],
    operation_id = "courseProgress"
)]
#[get("/courses/{slug}/progress")]
pub async fn course_progress(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CourseProgressView>> {
    let slug = path.into_inner();
    let user_id = session.user_id()?;
    let view = state.catalogue.course_progress(&slug, user_id).await?;
    Ok(web::Json(view))
}

/// Module content with its learner quiz, generated on first access.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{slug}/modules/{number}",
    params(
        ("slug" = String, Path, description = "Course slug"),
        ("number" = i64, Path, description = "Module number, 1 to 10")
    ),
    responses(
        (status = 200, description = "Module content", body = ModuleViewSchema),
        (status = 400, description = "Module number out of range", body = Error),
        (status = 403, description = "Module still locked", body = Error),
        (status = 404, description = "Unknown course", body = Error),
        (status = 402, description = "AI provider quota exhausted", body = Error),
        (status = 429, description = "AI provider rate limited", body = Error),
        (status = 503, description = "Generation failed; try again", body = Error)
    ),
    tags = ["courses"],
    operation_id = "getModule"
)]
#[get("/courses/{slug}/modules/{number}")]
pub async fn get_module(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, i64)>,
) -> ApiResult<web::Json<ModuleView>> {
    let (course_slug, raw_number) = path.into_inner();
    let module_number = ModuleNumber::new(raw_number).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "number", "value": raw_number }))
    })?;
    let user_id = session.user_id()?;
    debug!(course = %course_slug, module = %module_number, "module requested");
    let view = state
        .modules
        .get_module(ModuleRequest {
            course_slug,
            module_number,
            user_id,
        })
        .await?;
    Ok(web::Json(view))
}

#[cfg(test)]
#[path = "courses_tests.rs"]
mod tests;
