//! Learner profiles and the points leaderboard.

use std::sync::Arc;

use async_trait::async_trait;

use super::port_error_mapping::map_profile_error;
use super::ports::{MAX_LEADERBOARD_SIZE, ProfileQuery, ProfileRepository};
use super::{Error, LeaderboardEntry, Profile, UserId};

pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }
}

#[async_trait]
impl ProfileQuery for ProfileService {
    async fn profile(&self, user_id: &UserId) -> Result<Profile, Error> {
        let profile = self
            .profiles
            .find(user_id)
            .await
            .map_err(map_profile_error)?;
        Ok(profile.unwrap_or_else(|| Profile::new(user_id.clone())))
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, Error> {
        let limit = limit.clamp(1, MAX_LEADERBOARD_SIZE);
        let profiles = self
            .profiles
            .top_by_points(limit)
            .await
            .map_err(map_profile_error)?;
        Ok(profiles
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(index, profile)| LeaderboardEntry {
                rank: index + 1,
                name: profile.display_name().to_owned(),
                points: profile.points,
                badge_count: profile.badges.len(),
                user_id: profile.user_id,
            })
            .collect())
    }
}
