//! PostgreSQL-backed `ResultRepository`. Rows are insert-only.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::NewAttempt;
use crate::domain::ports::{ResultRepository, ResultRepositoryError};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::NewResultRow;
use super::pool::DbPool;
use super::schema::results;

#[derive(Clone)]
pub struct DieselResultRepository {
    pool: DbPool,
}

impl DieselResultRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultRepository for DieselResultRepository {
    async fn insert(&self, attempt: &NewAttempt) -> Result<Uuid, ResultRepositoryError> {
        let answers = serde_json::to_value(&attempt.answers)
            .map_err(|err| ResultRepositoryError::query(err.to_string()))?;
        let row = NewResultRow {
            id: Uuid::new_v4(),
            user_id: *attempt.user_id.as_uuid(),
            quiz_id: *attempt.quiz_id.as_uuid(),
            module_id: attempt.module_id.map(|id| *id.as_uuid()),
            course_id: attempt.course_id.map(|id| *id.as_uuid()),
            score: attempt.score,
            max_score: attempt.max_score,
            answers,
            completed_at: attempt.completed_at,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(results::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.id)
    }
}
