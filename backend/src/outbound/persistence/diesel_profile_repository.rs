//! PostgreSQL-backed `ProfileRepository`.
//!
//! Profiles are created lazily. Badge grants lock the row with
//! `SELECT ... FOR UPDATE` so concurrent evaluations never award a badge
//! twice.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{ProfileRepository, ProfileRepositoryError};
use crate::domain::{Badge, Profile, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewProfileRow, ProfileRow, parse_badges};
use super::pool::DbPool;
use super::schema::profiles;

#[derive(Clone)]
pub struct DieselProfileRepository {
    pool: DbPool,
}

impl DieselProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Badges from `candidates` not already in `held`, without repeats.
fn missing_badges(held: &[Badge], candidates: &[Badge]) -> Vec<Badge> {
    let mut added: Vec<Badge> = Vec::new();
    for badge in candidates {
        if !held.contains(badge) && !added.contains(badge) {
            added.push(*badge);
        }
    }
    added
}

async fn ensure_profile(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
) -> Result<(), diesel::result::Error> {
    diesel::insert_into(profiles::table)
        .values(&NewProfileRow {
            user_id,
            points: 0,
            badges: Vec::new(),
        })
        .on_conflict_do_nothing()
        .execute(conn)
        .await
        .map(|_| ())
}

#[async_trait]
impl ProfileRepository for DieselProfileRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ProfileRow> = profiles::table
            .find(*user_id.as_uuid())
            .select(ProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Profile::from))
    }

    async fn add_points(
        &self,
        user_id: &UserId,
        points: i64,
    ) -> Result<(), ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(profiles::table)
            .values(&NewProfileRow {
                user_id: *user_id.as_uuid(),
                points,
                badges: Vec::new(),
            })
            .on_conflict(profiles::user_id)
            .do_update()
            .set((
                profiles::points.eq(profiles::points + points),
                profiles::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        debug!(%user_id, points, "credited points");
        Ok(())
    }

    async fn grant_badges(
        &self,
        user_id: &UserId,
        badges: &[Badge],
        points_per_badge: i64,
    ) -> Result<Vec<Badge>, ProfileRepositoryError> {
        if badges.is_empty() {
            return Ok(Vec::new());
        }
        let user_uuid = *user_id.as_uuid();
        let candidates = badges.to_vec();

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                ensure_profile(conn, user_uuid).await?;
                let stored: Vec<String> = profiles::table
                    .find(user_uuid)
                    .select(profiles::badges)
                    .for_update()
                    .first(conn)
                    .await?;

                let held = parse_badges(&stored, user_uuid);
                let added = missing_badges(&held, &candidates);
                if added.is_empty() {
                    return Ok(added);
                }

                let mut merged = stored;
                merged.extend(added.iter().map(|badge| badge.as_str().to_owned()));
                let count = i64::try_from(added.len()).unwrap_or(i64::MAX);
                let bonus = points_per_badge.saturating_mul(count);

                diesel::update(profiles::table.find(user_uuid))
                    .set((
                        profiles::badges.eq(merged),
                        profiles::points.eq(profiles::points + bonus),
                        profiles::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(added)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn top_by_points(&self, limit: usize) -> Result<Vec<Profile>, ProfileRepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ProfileRow> = profiles::table
            .order_by((
                profiles::points.desc(),
                profiles::name.asc(),
                profiles::user_id,
            ))
            .limit(limit)
            .select(ProfileRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[], &[Badge::FirstSteps], &[Badge::FirstSteps])]
    #[case(&[Badge::FirstSteps], &[Badge::FirstSteps, Badge::Diligent], &[Badge::Diligent])]
    #[case(&[Badge::Certified], &[Badge::Certified], &[])]
    #[case(&[], &[Badge::Pro, Badge::Pro], &[Badge::Pro])]
    fn only_unheld_badges_are_added(
        #[case] held: &[Badge],
        #[case] candidates: &[Badge],
        #[case] expected: &[Badge],
    ) {
        assert_eq!(missing_badges(held, candidates), expected);
    }
}
