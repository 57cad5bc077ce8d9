//! Port for learner profiles: points and badges.

use async_trait::async_trait;

use crate::domain::{Badge, Profile, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile repository adapters.
    pub enum ProfileRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "profile repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "profile repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileRepositoryError>;

    /// Atomically add `points` to the balance, creating the profile if needed.
    async fn add_points(&self, user_id: &UserId, points: i64) -> Result<(), ProfileRepositoryError>;

    /// Add every badge in `badges` the learner does not hold yet and credit
    /// `points_per_badge` for each one added, in a single transaction.
    ///
    /// Returns the badges actually added, in the order given.
    async fn grant_badges(
        &self,
        user_id: &UserId,
        badges: &[Badge],
        points_per_badge: i64,
    ) -> Result<Vec<Badge>, ProfileRepositoryError>;

    /// Highest balances first; ties broken by name.
    async fn top_by_points(&self, limit: usize) -> Result<Vec<Profile>, ProfileRepositoryError>;
}

/// Fixture implementation with no profiles.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProfileRepository;

#[async_trait]
impl ProfileRepository for FixtureProfileRepository {
    async fn find(&self, _user_id: &UserId) -> Result<Option<Profile>, ProfileRepositoryError> {
        Ok(None)
    }

    async fn add_points(
        &self,
        _user_id: &UserId,
        _points: i64,
    ) -> Result<(), ProfileRepositoryError> {
        Ok(())
    }

    async fn grant_badges(
        &self,
        _user_id: &UserId,
        badges: &[Badge],
        _points_per_badge: i64,
    ) -> Result<Vec<Badge>, ProfileRepositoryError> {
        Ok(badges.to_vec())
    }

    async fn top_by_points(&self, _limit: usize) -> Result<Vec<Profile>, ProfileRepositoryError> {
        Ok(Vec::new())
    }
}
