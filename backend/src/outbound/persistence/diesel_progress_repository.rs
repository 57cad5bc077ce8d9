//! PostgreSQL-backed `ProgressRepository`.
//!
//! A completion and the points it earns are written in one transaction, and
//! the points are only credited by the call that flips the row to completed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{ProgressRepository, ProgressRepositoryError};
use crate::domain::{
    CompletionWrite, CourseId, ModuleCompletion, ModuleId, ModuleNumber, UserId,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewProfileRow, NewProgressRow};
use super::pool::DbPool;
use super::schema::{modules, profiles, user_module_progress};

type CompletionTuple = (Uuid, Uuid, i16, Option<DateTime<Utc>>);

#[derive(Clone)]
pub struct DieselProgressRepository {
    pool: DbPool,
}

impl DieselProgressRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_completion(
    (module_id, course_id, number, completed_at): CompletionTuple,
) -> Result<ModuleCompletion, ProgressRepositoryError> {
    let module_number = ModuleNumber::new(i64::from(number))
        .map_err(|err| ProgressRepositoryError::query(err.to_string()))?;
    let completed_at = completed_at.ok_or_else(|| {
        ProgressRepositoryError::query("completed progress row has no completion time")
    })?;
    Ok(ModuleCompletion {
        module_id: ModuleId::from_uuid(module_id),
        course_id: CourseId::from_uuid(course_id),
        module_number,
        completed_at,
    })
}

#[async_trait]
impl ProgressRepository for DieselProgressRepository {
    async fn record_completion(
        &self,
        write: &CompletionWrite,
    ) -> Result<bool, ProgressRepositoryError> {
        let user_id = *write.user_id.as_uuid();
        let module_id = *write.module_id.as_uuid();
        let new_row = NewProgressRow {
            user_id,
            module_id,
            course_id: *write.course_id.as_uuid(),
            completed: true,
            completed_at: Some(write.completed_at),
        };
        let points = write.points;
        let completed_at = write.completed_at;

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let newly_completed = conn
            .transaction(|conn| {
                async move {
                    let inserted = diesel::insert_into(user_module_progress::table)
                        .values(&new_row)
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                    // An existing, not yet completed row is flipped here; the
                    // row lock makes exactly one concurrent caller win.
                    let flipped = if inserted == 0 {
                        diesel::update(user_module_progress::table)
                            .filter(user_module_progress::user_id.eq(user_id))
                            .filter(user_module_progress::module_id.eq(module_id))
                            .filter(user_module_progress::completed.eq(false))
                            .set((
                                user_module_progress::completed.eq(true),
                                user_module_progress::completed_at.eq(Some(completed_at)),
                            ))
                            .execute(conn)
                            .await?
                    } else {
                        0
                    };
                    let newly_completed = inserted + flipped > 0;

                    if newly_completed && points != 0 {
                        diesel::insert_into(profiles::table)
                            .values(&NewProfileRow {
                                user_id,
                                points,
                                badges: Vec::new(),
                            })
                            .on_conflict(profiles::user_id)
                            .do_update()
                            .set((
                                profiles::points.eq(profiles::points + points),
                                profiles::updated_at.eq(diesel::dsl::now),
                            ))
                            .execute(conn)
                            .await?;
                    }
                    Ok::<_, diesel::result::Error>(newly_completed)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        debug!(%user_id, %module_id, newly_completed, "recorded module completion");
        Ok(newly_completed)
    }

    async fn list_for_course(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<ModuleCompletion>, ProgressRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CompletionTuple> = user_module_progress::table
            .inner_join(modules::table)
            .filter(user_module_progress::user_id.eq(user_id.as_uuid()))
            .filter(user_module_progress::course_id.eq(course_id.as_uuid()))
            .filter(user_module_progress::completed.eq(true))
            .order_by(modules::module_number)
            .select((
                user_module_progress::module_id,
                user_module_progress::course_id,
                modules::module_number,
                user_module_progress::completed_at,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(to_completion).collect()
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ModuleCompletion>, ProgressRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CompletionTuple> = user_module_progress::table
            .inner_join(modules::table)
            .filter(user_module_progress::user_id.eq(user_id.as_uuid()))
            .filter(user_module_progress::completed.eq(true))
            .order_by(user_module_progress::completed_at.asc())
            .select((
                user_module_progress::module_id,
                user_module_progress::course_id,
                modules::module_number,
                user_module_progress::completed_at,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(to_completion).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    fn completion_rows_need_a_timestamp() {
        let err = to_completion((Uuid::nil(), Uuid::nil(), 3, None)).expect_err("missing time");
        assert!(matches!(err, ProgressRepositoryError::Query { .. }));
    }

    #[rstest]
    fn completion_rows_convert() {
        let at = Utc.with_ymd_and_hms(2026, 2, 24, 10, 30, 0).single().expect("valid");
        let completion =
            to_completion((Uuid::nil(), Uuid::nil(), 10, Some(at))).expect("valid row");
        assert_eq!(completion.module_number, ModuleNumber::LAST);
        assert_eq!(completion.completed_at, at);
    }
}
