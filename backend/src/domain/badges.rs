//! Badge rules and the awarder that applies them.
//!
//! Rules are evaluated against aggregate learner statistics. A badge is
//! granted at most once; re-evaluating never re-awards it.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use mockable::Clock;
use tracing::info;

use super::port_error_mapping::{map_certificate_error, map_profile_error, map_progress_error};
use super::ports::{CertificateRepository, ProfileRepository, ProgressRepository};
use super::{Badge, Certificate, Error, MODULE_COUNT, ModuleCompletion, UserId};

/// Points credited for each newly granted badge.
pub const BADGE_POINTS: i64 = 20;
/// Consecutive active days required for [`Badge::Determined`].
pub const STREAK_DAYS: u32 = 7;

/// Aggregate activity a learner is judged on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LearnerStats {
    pub total_completed: usize,
    pub distinct_courses: usize,
    pub best_course_completed: usize,
    pub certificate_count: usize,
    pub best_certificate_score: Option<f64>,
    /// Consecutive days with at least one completion, counted back from today.
    pub streak_days: u32,
}

impl LearnerStats {
    pub fn from_activity(
        completions: &[ModuleCompletion],
        certificates: &[Certificate],
        today: NaiveDate,
    ) -> Self {
        let mut per_course: HashMap<_, usize> = HashMap::new();
        for completion in completions {
            *per_course.entry(completion.course_id).or_default() += 1;
        }
        let active_days = completions
            .iter()
            .map(|completion| completion.completed_at.date_naive());
        Self {
            total_completed: completions.len(),
            distinct_courses: per_course.len(),
            best_course_completed: per_course.values().copied().max().unwrap_or(0),
            certificate_count: certificates.len(),
            best_certificate_score: certificates
                .iter()
                .map(|certificate| certificate.score)
                .reduce(f64::max),
            streak_days: current_streak(active_days, today),
        }
    }
}

/// Length of the run of consecutive active days ending today.
pub fn current_streak(active_days: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = active_days.into_iter().collect();
    let mut streak = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor.filter(|day| days.contains(day)) {
        streak += 1;
        cursor = day.checked_sub_days(Days::new(1));
    }
    streak
}

/// Rule-based badges in evaluation order. [`Badge::Certified`] is granted by
/// the certificate issuer instead.
const RULE_ORDER: [Badge; 8] = [
    Badge::FirstSteps,
    Badge::Diligent,
    Badge::Addict,
    Badge::Pro,
    Badge::Expert,
    Badge::Flawless,
    Badge::Master,
    Badge::Determined,
];

fn qualifies(badge: Badge, stats: &LearnerStats) -> bool {
    match badge {
        Badge::FirstSteps => stats.total_completed >= 1,
        Badge::Diligent => stats.total_completed >= 10,
        Badge::Addict => stats.distinct_courses >= 3,
        Badge::Pro => stats.total_completed >= 50,
        Badge::Expert => stats.best_course_completed >= usize::from(MODULE_COUNT),
        Badge::Flawless => stats.best_certificate_score.is_some_and(|score| score >= 90.0),
        Badge::Master => stats.certificate_count >= 3,
        Badge::Determined => stats.streak_days >= STREAK_DAYS,
        Badge::Certified => false,
    }
}

/// Every rule-based badge `stats` qualifies for, in rule order.
pub fn qualifying_badges(stats: &LearnerStats) -> Vec<Badge> {
    RULE_ORDER
        .into_iter()
        .filter(|badge| qualifies(*badge, stats))
        .collect()
}

/// Evaluates badge rules and records newly earned badges with their points.
pub struct BadgeAwarder {
    profiles: Arc<dyn ProfileRepository>,
    progress: Arc<dyn ProgressRepository>,
    certificates: Arc<dyn CertificateRepository>,
    clock: Arc<dyn Clock>,
}

impl BadgeAwarder {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        progress: Arc<dyn ProgressRepository>,
        certificates: Arc<dyn CertificateRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            progress,
            certificates,
            clock,
        }
    }

    /// Grant every badge the learner now qualifies for and does not hold.
    ///
    /// Returns only the badges granted by this call; an unchanged learner
    /// gets an empty list.
    pub async fn evaluate(&self, user_id: &UserId) -> Result<Vec<Badge>, Error> {
        let held = self
            .profiles
            .find(user_id)
            .await
            .map_err(map_profile_error)?
            .map(|profile| profile.badges)
            .unwrap_or_default();
        let completions = self
            .progress
            .list_for_user(user_id)
            .await
            .map_err(map_progress_error)?;
        let certificates = self
            .certificates
            .list_for_user(user_id)
            .await
            .map_err(map_certificate_error)?;

        let stats = LearnerStats::from_activity(
            &completions,
            &certificates,
            self.clock.utc().date_naive(),
        );
        let candidates: Vec<Badge> = qualifying_badges(&stats)
            .into_iter()
            .filter(|badge| !held.contains(badge))
            .collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let granted = self
            .profiles
            .grant_badges(user_id, &candidates, BADGE_POINTS)
            .await
            .map_err(map_profile_error)?;
        if !granted.is_empty() {
            info!(
                user_id = %user_id,
                badges = ?granted,
                "badges granted"
            );
        }
        Ok(granted)
    }
}

#[cfg(test)]
#[path = "badges_tests.rs"]
mod tests;
