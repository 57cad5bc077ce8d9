//! PostgreSQL-backed `ModuleRepository`.
//!
//! Saving generated content upserts the module row and inserts its module
//! quiz inside one transaction.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{GeneratedModuleRecord, ModuleRepository, ModuleRepositoryError};
use crate::domain::{CourseId, Module, ModuleId, ModuleNumber, Quiz, QuizType};

use super::error_mapping::{map_diesel_error, map_pool_error, map_row_error};
use super::models::{ModuleRow, NewModuleRow, NewQuizRow, QuizRow};
use super::pool::DbPool;
use super::schema::{modules, quizzes};

#[derive(Clone)]
pub struct DieselModuleRepository {
    pool: DbPool,
}

impl DieselModuleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, ModuleRepositoryError> {
    serde_json::to_value(value).map_err(|err| ModuleRepositoryError::query(err.to_string()))
}

#[async_trait]
impl ModuleRepository for DieselModuleRepository {
    async fn find_by_number(
        &self,
        course_id: &CourseId,
        number: ModuleNumber,
    ) -> Result<Option<Module>, ModuleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ModuleRow> = modules::table
            .filter(modules::course_id.eq(course_id.as_uuid()))
            .filter(modules::module_number.eq(i16::from(number.get())))
            .select(ModuleRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Module::try_from).transpose().map_err(map_row_error)
    }

    async fn find_by_id(&self, id: &ModuleId) -> Result<Option<Module>, ModuleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ModuleRow> = modules::table
            .find(*id.as_uuid())
            .select(ModuleRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Module::try_from).transpose().map_err(map_row_error)
    }

    async fn save_generated(
        &self,
        record: &GeneratedModuleRecord,
    ) -> Result<(Module, Quiz), ModuleRepositoryError> {
        let content = to_json(&record.content)?;
        let questions = to_json(&record.questions)?;
        let course_id = *record.course_id.as_uuid();
        let new_module = NewModuleRow {
            id: Uuid::new_v4(),
            course_id,
            module_number: i16::from(record.number.get()),
            title: &record.title,
            content,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (module_row, quiz_row) = conn
            .transaction(|conn| {
                async move {
                    let module_row: ModuleRow = diesel::insert_into(modules::table)
                        .values(&new_module)
                        .on_conflict((modules::course_id, modules::module_number))
                        .do_update()
                        .set((
                            modules::title.eq(excluded(modules::title)),
                            modules::content.eq(excluded(modules::content)),
                            modules::updated_at.eq(diesel::dsl::now),
                        ))
                        .returning(ModuleRow::as_returning())
                        .get_result(conn)
                        .await?;

                    let quiz_row: QuizRow = diesel::insert_into(quizzes::table)
                        .values(&NewQuizRow {
                            id: Uuid::new_v4(),
                            module_id: Some(module_row.id),
                            course_id: Some(course_id),
                            quiz_type: QuizType::Module.as_str(),
                            questions,
                        })
                        .returning(QuizRow::as_returning())
                        .get_result(conn)
                        .await?;

                    Ok::<_, diesel::result::Error>((module_row, quiz_row))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        debug!(module_id = %module_row.id, quiz_id = %quiz_row.id, "stored generated module");
        let module = Module::try_from(module_row).map_err(map_row_error)?;
        let quiz = Quiz::try_from(quiz_row).map_err(map_row_error)?;
        Ok((module, quiz))
    }
}
