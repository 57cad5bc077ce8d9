//! Learner profile: points balance and badge collection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::UserId;

/// Name shown for learners who never set one.
pub const DEFAULT_DISPLAY_NAME: &str = "Learner";

/// One-time achievement flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Badge {
    FirstSteps,
    Diligent,
    Addict,
    Pro,
    Expert,
    Flawless,
    Master,
    Determined,
    Certified,
}

impl Badge {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstSteps => "First steps",
            Self::Diligent => "Diligent",
            Self::Addict => "Addict",
            Self::Pro => "Pro",
            Self::Expert => "Expert",
            Self::Flawless => "Flawless",
            Self::Master => "Master",
            Self::Determined => "Determined",
            Self::Certified => "Certified",
        }
    }
}

/// Raised when a stored badge name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown badge: {0}")]
pub struct UnknownBadge(pub String);

impl FromStr for Badge {
    type Err = UnknownBadge;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::FirstSteps,
            Self::Diligent,
            Self::Addict,
            Self::Pro,
            Self::Expert,
            Self::Flawless,
            Self::Master,
            Self::Determined,
            Self::Certified,
        ]
        .into_iter()
        .find(|badge| badge.as_str() == s)
        .ok_or_else(|| UnknownBadge(s.to_owned()))
    }
}

impl TryFrom<String> for Badge {
    type Error = UnknownBadge;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Badge> for String {
    fn from(value: Badge) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Learner profile.
///
/// `badges` keeps grant order and never contains duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: UserId,
    pub name: Option<String>,
    pub points: i64,
    pub badges: Vec<Badge>,
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Empty profile for a learner who has not earned anything yet.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            name: None,
            points: 0,
            badges: Vec::new(),
            avatar_url: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    pub fn has_badge(&self, badge: Badge) -> bool {
        self.badges.contains(&badge)
    }
}

/// One row of the points leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: usize,
    pub user_id: UserId,
    pub name: String,
    pub points: i64,
    pub badge_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn badge_names_round_trip() {
        for badge in [Badge::FirstSteps, Badge::Determined, Badge::Certified] {
            assert_eq!(badge.as_str().parse::<Badge>(), Ok(badge));
        }
        assert!("Wizard".parse::<Badge>().is_err());
    }

    #[rstest]
    #[case(None, DEFAULT_DISPLAY_NAME)]
    #[case(Some("  "), DEFAULT_DISPLAY_NAME)]
    #[case(Some("Ada"), "Ada")]
    fn display_name_falls_back(#[case] name: Option<&str>, #[case] expected: &str) {
        let mut profile = Profile::new(UserId::random());
        profile.name = name.map(str::to_owned);
        assert_eq!(profile.display_name(), expected);
    }
}
