//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay free of utoipa derives. The wrappers here mirror their
//! serialised shape and register under the domain type's name, so generated
//! clients see `crate.domain.Course` rather than an adapter type.

#![expect(
    dead_code,
    reason = "Fields exist only for OpenAPI schema generation via utoipa"
)]

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::CourseLevel`].
#[derive(ToSchema)]
#[schema(as = crate::domain::CourseLevel)]
pub enum CourseLevelSchema {
    #[schema(rename = "beginner")]
    Beginner,
    #[schema(rename = "intermediate")]
    Intermediate,
    #[schema(rename = "advanced")]
    Advanced,
}

/// OpenAPI schema for [`crate::domain::Course`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Course, rename_all = "camelCase")]
pub struct CourseSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(example = "python")]
    slug: String,
    #[schema(example = "Python for beginners")]
    title: String,
    description: String,
    level: CourseLevelSchema,
    skills: Vec<String>,
    #[schema(example = "10 modules")]
    duration: String,
    icon: String,
}

/// OpenAPI schema for [`crate::domain::ModuleSlot`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ModuleSlot, rename_all = "camelCase")]
pub struct ModuleSlotSchema {
    #[schema(minimum = 1, maximum = 10)]
    number: u8,
    unlocked: bool,
    completed: bool,
}

/// OpenAPI schema for [`crate::domain::ports::CourseProgressView`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::CourseProgressView, rename_all = "camelCase")]
pub struct CourseProgressSchema {
    course: CourseSchema,
    modules: Vec<ModuleSlotSchema>,
    completed_count: usize,
    course_complete: bool,
    /// True when the learner is signed in and has completed every module.
    certification_available: bool,
}

/// OpenAPI schema for [`crate::domain::ports::ModuleView`].
///
/// The quiz never carries correct answers or expected answers.
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::ModuleView, rename_all = "camelCase")]
pub struct ModuleViewSchema {
    course_slug: String,
    course_title: String,
    /// Module number, title, explanation, examples, and exercise.
    #[schema(value_type = Object)]
    module: serde_json::Value,
    /// Learner view of the module quiz.
    #[schema(value_type = Object)]
    quiz: serde_json::Value,
    completed: bool,
}

/// OpenAPI schema for [`crate::domain::Answers`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Answers)]
pub struct AnswersSchema {
    /// Question index to chosen option index.
    #[schema(value_type = Object, example = json!({"0": 2, "1": 0}))]
    qcm: serde_json::Value,
    /// Question index to free-text answer.
    #[schema(value_type = Object, example = json!({"0": "A value has exactly one owner"}))]
    open: serde_json::Value,
}

/// OpenAPI schema for [`crate::domain::ports::QuizAttemptResponse`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::QuizAttemptResponse, rename_all = "camelCase")]
pub struct QuizAttemptSchema {
    #[schema(value_type = String, format = Uuid)]
    result_id: String,
    /// Weighted score out of 100.
    #[schema(minimum = 0, maximum = 100, example = 82.5)]
    score: f64,
    qcm_score: u32,
    qcm_total: u32,
    open_score: u32,
    open_total: u32,
    qcm_percent: f64,
    open_percent: f64,
    passed: bool,
    /// True when open answers received the fixed partial credit.
    open_fallback: bool,
    #[schema(value_type = Vec<Object>)]
    review: Vec<serde_json::Value>,
    module_completed: bool,
    course_complete: bool,
    #[schema(example = json!(["First steps"]))]
    new_badges: Vec<String>,
}

/// OpenAPI schema for [`crate::domain::ExamView`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ExamView, rename_all = "camelCase")]
pub struct ExamViewSchema {
    /// `intro`, `qcm`, `open`, `grading`, or `result`.
    #[schema(example = "qcm")]
    phase: String,
    /// Index of the question on screen while in `qcm` or `open`.
    index: Option<usize>,
    /// `not_started`, `in_progress`, `completed`, or `expired`.
    #[schema(example = "in_progress")]
    status: String,
    remaining_seconds: i64,
    qcm_count: usize,
    open_count: usize,
    #[schema(value_type = Option<Object>)]
    current_question: Option<serde_json::Value>,
    answers: AnswersSchema,
    can_submit: bool,
    passed: Option<bool>,
    /// Graded with the certificate when issued, or timed out.
    #[schema(value_type = Option<Object>)]
    outcome: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::VerifiedCertificate`].
#[derive(ToSchema)]
#[schema(as = crate::domain::VerifiedCertificate, rename_all = "camelCase")]
pub struct VerifiedCertificateSchema {
    #[schema(example = "Learner")]
    holder_name: String,
    course_title: String,
    score: f64,
    #[schema(value_type = String, format = DateTime)]
    issued_at: String,
    verification_code: String,
}

/// OpenAPI schema for [`crate::domain::Profile`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Profile, rename_all = "camelCase")]
pub struct ProfileSchema {
    #[schema(value_type = String, format = Uuid)]
    user_id: String,
    name: Option<String>,
    points: i64,
    #[schema(example = json!(["First steps", "Diligent"]))]
    badges: Vec<String>,
    avatar_url: Option<String>,
}

/// OpenAPI schema for [`crate::domain::LeaderboardEntry`].
#[derive(ToSchema)]
#[schema(as = crate::domain::LeaderboardEntry, rename_all = "camelCase")]
pub struct LeaderboardEntrySchema {
    #[schema(minimum = 1)]
    rank: usize,
    #[schema(value_type = String, format = Uuid)]
    user_id: String,
    #[schema(example = "Learner")]
    name: String,
    points: i64,
    badge_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::PartialSchema;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[rstest]
    fn schemas_register_under_domain_names() {
        // utoipa replaces :: with . in schema names
        assert_eq!(CourseSchema::name(), "crate.domain.Course");
        assert_eq!(ExamViewSchema::name(), "crate.domain.ExamView");
        assert_eq!(
            CourseProgressSchema::name(),
            "crate.domain.ports.CourseProgressView"
        );
    }

    #[rstest]
    #[case::course(schema_to_json::<CourseSchema>(), "skills")]
    #[case::progress(schema_to_json::<CourseProgressSchema>(), "certificationAvailable")]
    #[case::exam(schema_to_json::<ExamViewSchema>(), "remainingSeconds")]
    #[case::certificate(schema_to_json::<VerifiedCertificateSchema>(), "verificationCode")]
    #[case::leaderboard(schema_to_json::<LeaderboardEntrySchema>(), "rank")]
    fn schemas_use_wire_field_names(#[case] json: String, #[case] field: &str) {
        assert!(json.contains(field), "schema should contain {field}: {json}");
    }

    #[rstest]
    fn level_schema_lists_every_level() {
        let json = schema_to_json::<CourseLevelSchema>();
        for level in ["beginner", "intermediate", "advanced"] {
            assert!(json.contains(level), "missing {level}");
        }
    }
}
