//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` route, the health probes, the
//! request bodies, and the schema wrappers from
//! [`crate::inbound::http::schemas`]. Swagger UI serves it in debug builds
//! and the `openapi-dump` binary prints it for tooling.

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::auth::LoginRequest;
use crate::inbound::http::certification::AnswerRequest;
use crate::inbound::http::quizzes::AttemptRequest;
use crate::inbound::http::schemas::{
    AnswersSchema, CourseLevelSchema, CourseProgressSchema, CourseSchema, ExamViewSchema,
    LeaderboardEntrySchema, ModuleSlotSchema, ModuleViewSchema, ProfileSchema, QuizAttemptSchema,
    VerifiedCertificateSchema,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Skillflash API",
        description = "Courses, module quizzes, timed certification exams, certificates, and learner rewards."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::courses::list_courses,
        crate::inbound::http::courses::course_progress,
        crate::inbound::http::courses::get_module,
        crate::inbound::http::quizzes::submit_attempt,
        crate::inbound::http::certification::view_exam,
        crate::inbound::http::certification::start_exam,
        crate::inbound::http::certification::answer_question,
        crate::inbound::http::certification::next_question,
        crate::inbound::http::certification::previous_question,
        crate::inbound::http::certification::submit_exam,
        crate::inbound::http::certification::retry_exam,
        crate::inbound::http::certificates::verify_certificate,
        crate::inbound::http::profiles::current_profile,
        crate::inbound::http::profiles::leaderboard,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        LoginRequest,
        AttemptRequest,
        AnswerRequest,
        AnswersSchema,
        CourseLevelSchema,
        CourseSchema,
        ModuleSlotSchema,
        CourseProgressSchema,
        ModuleViewSchema,
        QuizAttemptSchema,
        ExamViewSchema,
        VerifiedCertificateSchema,
        ProfileSchema,
        LeaderboardEntrySchema,
    )),
    tags(
        (name = "auth", description = "Session login and logout"),
        (name = "courses", description = "Catalogue, progress, and module content"),
        (name = "quizzes", description = "Module quiz attempts"),
        (name = "certification", description = "The timed certification exam"),
        (name = "certificates", description = "Public certificate verification"),
        (name = "profiles", description = "Points, badges, and the leaderboard"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
