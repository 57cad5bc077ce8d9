//! Internal Diesel row structs and their conversions into domain entities.
//!
//! Rows never leave the persistence layer. JSON columns are decoded strictly
//! so a malformed stored quiz surfaces as a query error instead of a panic.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Badge, Certificate, Course, CourseId, Module, ModuleId, ModuleNumber, Profile, Quiz, QuizId,
    UserId, VerificationCode,
};

use super::schema::{
    certificates, courses, modules, profiles, quizzes, results, user_module_progress,
};

/// A stored row that cannot be turned back into its domain entity.
#[derive(Debug, thiserror::Error)]
pub(crate) enum RowDecodeError {
    #[error("stored {column} is malformed: {source}")]
    Json {
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored {column} is invalid: {message}")]
    Value {
        column: &'static str,
        message: String,
    },
}

impl RowDecodeError {
    fn json(column: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Json { column, source }
    }

    fn value(column: &'static str) -> impl FnOnce(String) -> Self {
        move |message| Self::Value { column, message }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = courses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CourseRow {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub level: String,
    pub skills: Vec<String>,
    pub duration: String,
    pub icon: String,
}

impl TryFrom<CourseRow> for Course {
    type Error = RowDecodeError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        let level = row
            .level
            .parse()
            .map_err(|err: crate::domain::CourseValidationError| err.to_string())
            .map_err(RowDecodeError::value("course level"))?;
        Ok(Self {
            id: CourseId::from_uuid(row.id),
            slug: row.slug,
            title: row.title,
            description: row.description,
            level,
            skills: row.skills,
            duration: row.duration,
            icon: row.icon,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = modules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ModuleRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub module_number: i16,
    pub title: String,
    pub content: serde_json::Value,
}

impl TryFrom<ModuleRow> for Module {
    type Error = RowDecodeError;

    fn try_from(row: ModuleRow) -> Result<Self, Self::Error> {
        let number = ModuleNumber::new(i64::from(row.module_number))
            .map_err(|err| err.to_string())
            .map_err(RowDecodeError::value("module number"))?;
        let content =
            serde_json::from_value(row.content).map_err(RowDecodeError::json("module content"))?;
        Ok(Self {
            id: ModuleId::from_uuid(row.id),
            course_id: CourseId::from_uuid(row.course_id),
            number,
            title: row.title,
            content,
        })
    }
}

/// Upsert payload keyed by `(course_id, module_number)`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = modules)]
pub(crate) struct NewModuleRow<'a> {
    pub id: Uuid,
    pub course_id: Uuid,
    pub module_number: i16,
    pub title: &'a str,
    pub content: serde_json::Value,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = quizzes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct QuizRow {
    pub id: Uuid,
    pub module_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub quiz_type: String,
    pub questions: serde_json::Value,
}

impl TryFrom<QuizRow> for Quiz {
    type Error = RowDecodeError;

    fn try_from(row: QuizRow) -> Result<Self, Self::Error> {
        let quiz_type = row
            .quiz_type
            .parse()
            .map_err(|err: crate::domain::QuizValidationError| err.to_string())
            .map_err(RowDecodeError::value("quiz type"))?;
        let questions =
            serde_json::from_value(row.questions).map_err(RowDecodeError::json("quiz questions"))?;
        Ok(Self {
            id: QuizId::from_uuid(row.id),
            module_id: row.module_id.map(ModuleId::from_uuid),
            course_id: row.course_id.map(CourseId::from_uuid),
            quiz_type,
            questions,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = quizzes)]
pub(crate) struct NewQuizRow<'a> {
    pub id: Uuid,
    pub module_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub quiz_type: &'a str,
    pub questions: serde_json::Value,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = results)]
pub(crate) struct NewResultRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub module_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub score: f64,
    pub max_score: i32,
    pub answers: serde_json::Value,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_module_progress)]
pub(crate) struct NewProgressRow {
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub course_id: Uuid,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = certificates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CertificateRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub score: f64,
    pub verification_code: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CertificateRow> for Certificate {
    type Error = RowDecodeError;

    fn try_from(row: CertificateRow) -> Result<Self, Self::Error> {
        let verification_code = VerificationCode::new(&row.verification_code)
            .map_err(|err| err.to_string())
            .map_err(RowDecodeError::value("verification code"))?;
        Ok(Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            course_id: CourseId::from_uuid(row.course_id),
            score: row.score,
            verification_code,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = certificates)]
pub(crate) struct NewCertificateRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub score: f64,
    pub verification_code: &'a str,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProfileRow {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub points: i64,
    pub badges: Vec<String>,
    pub avatar_url: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            name: row.name,
            points: row.points,
            badges: parse_badges(&row.badges, row.user_id),
            avatar_url: row.avatar_url,
        }
    }
}

/// Decode stored badge names, skipping names this build does not know.
pub(crate) fn parse_badges(names: &[String], user_id: Uuid) -> Vec<Badge> {
    names
        .iter()
        .filter_map(|name| match name.parse::<Badge>() {
            Ok(badge) => Some(badge),
            Err(_) => {
                tracing::warn!(badge = %name, %user_id, "ignoring unrecognised stored badge");
                None
            }
        })
        .collect()
}

/// Profile created lazily by the first award.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profiles)]
pub(crate) struct NewProfileRow {
    pub user_id: Uuid,
    pub points: i64,
    pub badges: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CourseLevel, QuizType};
    use rstest::rstest;
    use serde_json::json;

    fn course_row(level: &str) -> CourseRow {
        CourseRow {
            id: Uuid::nil(),
            slug: "rust-basics".to_owned(),
            title: "Rust Basics".to_owned(),
            description: "Ownership and borrowing".to_owned(),
            level: level.to_owned(),
            skills: vec!["ownership".to_owned()],
            duration: "10h".to_owned(),
            icon: "crab".to_owned(),
        }
    }

    #[rstest]
    fn course_rows_parse_their_level() {
        let course = Course::try_from(course_row("intermediate")).expect("valid row");
        assert_eq!(course.level, CourseLevel::Intermediate);
        assert!(Course::try_from(course_row("expert")).is_err());
    }

    #[rstest]
    #[case(0)]
    #[case(11)]
    fn module_rows_reject_out_of_range_numbers(#[case] number: i16) {
        let row = ModuleRow {
            id: Uuid::nil(),
            course_id: Uuid::nil(),
            module_number: number,
            title: "Intro".to_owned(),
            content: json!({
                "explanation": "x",
                "examples": [],
                "exercise": {"title": "t", "description": "d"}
            }),
        };
        let err = Module::try_from(row).expect_err("out of range");
        assert!(err.to_string().contains("module number"));
    }

    #[rstest]
    fn quiz_rows_validate_stored_questions() {
        let row = QuizRow {
            id: Uuid::nil(),
            module_id: None,
            course_id: Some(Uuid::nil()),
            quiz_type: "module".to_owned(),
            questions: json!({
                "qcm": [{"question": "Pick", "options": ["a", "b"], "correct": 5}],
                "open": []
            }),
        };
        let err = Quiz::try_from(row).expect_err("correct index out of range");
        assert!(matches!(err, RowDecodeError::Json { column: "quiz questions", .. }));
    }

    #[rstest]
    fn quiz_rows_decode_valid_questions() {
        let row = QuizRow {
            id: Uuid::nil(),
            module_id: None,
            course_id: Some(Uuid::nil()),
            quiz_type: "certification".to_owned(),
            questions: json!({"qcm": [], "open": []}),
        };
        let quiz = Quiz::try_from(row).expect("valid row");
        assert_eq!(quiz.quiz_type, QuizType::Certification);
        assert!(quiz.questions.is_empty());
    }

    #[rstest]
    fn unknown_badges_are_skipped() {
        let names = vec!["First steps".to_owned(), "Wizard".to_owned()];
        assert_eq!(parse_badges(&names, Uuid::nil()), vec![Badge::FirstSteps]);
    }
}
