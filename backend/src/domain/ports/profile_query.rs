//! Driving port for learner profiles and the leaderboard.

use async_trait::async_trait;

use crate::domain::{Error, LeaderboardEntry, Profile, UserId};

/// Leaderboard size used when the caller does not ask for one.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 20;
/// Largest leaderboard a caller may request.
pub const MAX_LEADERBOARD_SIZE: usize = 100;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileQuery: Send + Sync {
    /// Profile of `user_id`; learners without a stored profile get an empty one.
    async fn profile(&self, user_id: &UserId) -> Result<Profile, Error>;

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, Error>;
}

/// Fixture implementation with no stored profiles.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProfileQuery;

#[async_trait]
impl ProfileQuery for FixtureProfileQuery {
    async fn profile(&self, user_id: &UserId) -> Result<Profile, Error> {
        Ok(Profile::new(user_id.clone()))
    }

    async fn leaderboard(&self, _limit: usize) -> Result<Vec<LeaderboardEntry>, Error> {
        Ok(Vec::new())
    }
}
