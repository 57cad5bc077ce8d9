//! PostgreSQL-backed `QuizRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{QuizRepository, QuizRepositoryError};
use crate::domain::{CourseId, ModuleId, ModuleNumber, QuestionSet, Quiz, QuizId, QuizType};

use super::error_mapping::{map_diesel_error, map_pool_error, map_row_error};
use super::models::{NewQuizRow, QuizRow};
use super::pool::DbPool;
use super::schema::{modules, quizzes};

#[derive(Clone)]
pub struct DieselQuizRepository {
    pool: DbPool,
}

impl DieselQuizRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuizRepository for DieselQuizRepository {
    async fn find_by_id(&self, id: &QuizId) -> Result<Option<Quiz>, QuizRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<QuizRow> = quizzes::table
            .find(*id.as_uuid())
            .select(QuizRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Quiz::try_from).transpose().map_err(map_row_error)
    }

    async fn latest_for_module(
        &self,
        module_id: &ModuleId,
    ) -> Result<Option<Quiz>, QuizRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<QuizRow> = quizzes::table
            .filter(quizzes::module_id.eq(module_id.as_uuid()))
            .filter(quizzes::quiz_type.eq(QuizType::Module.as_str()))
            .order_by(quizzes::created_at.desc())
            .select(QuizRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Quiz::try_from).transpose().map_err(map_row_error)
    }

    async fn latest_module_quizzes(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<(ModuleNumber, Quiz)>, QuizRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // DISTINCT ON keeps the newest quiz per module.
        let rows: Vec<(i16, QuizRow)> = quizzes::table
            .inner_join(modules::table)
            .filter(modules::course_id.eq(course_id.as_uuid()))
            .filter(quizzes::quiz_type.eq(QuizType::Module.as_str()))
            .distinct_on(modules::module_number)
            .order_by((modules::module_number, quizzes::created_at.desc()))
            .select((modules::module_number, QuizRow::as_select()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|(number, row)| {
                let number = ModuleNumber::new(i64::from(number))
                    .map_err(|err| QuizRepositoryError::query(err.to_string()))?;
                let quiz = Quiz::try_from(row).map_err(map_row_error)?;
                Ok((number, quiz))
            })
            .collect()
    }

    async fn ensure_certification_quiz(
        &self,
        course_id: &CourseId,
    ) -> Result<QuizId, QuizRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let existing: Option<Uuid> = quizzes::table
            .filter(quizzes::course_id.eq(course_id.as_uuid()))
            .filter(quizzes::quiz_type.eq(QuizType::Certification.as_str()))
            .order_by(quizzes::created_at.asc())
            .select(quizzes::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        if let Some(id) = existing {
            return Ok(QuizId::from_uuid(id));
        }

        let questions = serde_json::to_value(QuestionSet::default())
            .map_err(|err| QuizRepositoryError::query(err.to_string()))?;
        // A partial unique index keeps one certification quiz per course, so
        // a concurrent creator makes this insert a no-op.
        diesel::insert_into(quizzes::table)
            .values(&NewQuizRow {
                id: Uuid::new_v4(),
                module_id: None,
                course_id: Some(*course_id.as_uuid()),
                quiz_type: QuizType::Certification.as_str(),
                questions,
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        quizzes::table
            .filter(quizzes::course_id.eq(course_id.as_uuid()))
            .filter(quizzes::quiz_type.eq(QuizType::Certification.as_str()))
            .select(quizzes::id)
            .first(&mut conn)
            .await
            .map(QuizId::from_uuid)
            .map_err(map_diesel_error)
    }
}
