//! Module progress tracking and sequential unlocking.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::port_error_mapping::map_progress_error;
use super::ports::ProgressRepository;
use super::{
    Badge, BadgeAwarder, CourseId, Error, MODULE_COUNT, Module, ModuleId, ModuleNumber, UserId,
};

/// Points credited the first time a learner completes a module.
pub const MODULE_COMPLETION_POINTS: i64 = 10;

/// A completed module as stored for a learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCompletion {
    pub module_id: ModuleId,
    pub course_id: CourseId,
    pub module_number: ModuleNumber,
    pub completed_at: DateTime<Utc>,
}

/// Completion upsert plus the points it carries on first completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionWrite {
    pub user_id: UserId,
    pub module_id: ModuleId,
    pub course_id: CourseId,
    pub completed_at: DateTime<Utc>,
    pub points: i64,
}

/// Access state of one module slot in a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSlot {
    pub number: ModuleNumber,
    pub unlocked: bool,
    pub completed: bool,
}

/// Whether a learner has completed every module of a course.
pub fn is_course_complete(completed_count: usize) -> bool {
    completed_count >= usize::from(MODULE_COUNT)
}

/// Whether module `number` may be opened.
///
/// Module 1 is always open, module N opens once N-1 is completed, and
/// anonymous visitors may preview everything.
pub fn is_unlocked(
    number: ModuleNumber,
    completed: &BTreeSet<ModuleNumber>,
    authenticated: bool,
) -> bool {
    !authenticated
        || number
            .previous()
            .is_none_or(|previous| completed.contains(&previous))
}

/// Unlock and completion state for every module of a course.
///
/// # Examples
/// ```
/// use std::collections::BTreeSet;
/// use skillflash::domain::{derive_unlock_state, ModuleNumber};
///
/// let done = BTreeSet::from([ModuleNumber::FIRST]);
/// let slots = derive_unlock_state(&done, true);
/// assert!(slots[1].unlocked);
/// assert!(!slots[2].unlocked);
/// ```
pub fn derive_unlock_state(
    completed: &BTreeSet<ModuleNumber>,
    authenticated: bool,
) -> Vec<ModuleSlot> {
    ModuleNumber::all()
        .map(|number| ModuleSlot {
            number,
            unlocked: is_unlocked(number, completed, authenticated),
            completed: completed.contains(&number),
        })
        .collect()
}

/// Result of recording a module completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// True only for the first completion of this module by this learner.
    pub newly_completed: bool,
    pub completed: BTreeSet<ModuleNumber>,
    pub new_badges: Vec<Badge>,
}

/// Records completions, credits module points, and triggers badge awards.
#[derive(Clone)]
pub struct ProgressTracker {
    progress: Arc<dyn ProgressRepository>,
    awarder: Arc<BadgeAwarder>,
    clock: Arc<dyn Clock>,
}

impl ProgressTracker {
    pub fn new(
        progress: Arc<dyn ProgressRepository>,
        awarder: Arc<BadgeAwarder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            progress,
            awarder,
            clock,
        }
    }

    /// Mark `module` completed for `user_id`.
    ///
    /// Repeated calls leave one row and never re-credit points or re-run the
    /// badge evaluation. Badge evaluation failures are logged and skipped;
    /// the next completion re-evaluates every rule anyway.
    pub async fn record_completion(
        &self,
        user_id: &UserId,
        module: &Module,
    ) -> Result<CompletionOutcome, Error> {
        let write = CompletionWrite {
            user_id: user_id.clone(),
            module_id: module.id,
            course_id: module.course_id,
            completed_at: self.clock.utc(),
            points: MODULE_COMPLETION_POINTS,
        };
        let newly_completed = self
            .progress
            .record_completion(&write)
            .await
            .map_err(map_progress_error)?;

        let new_badges = if newly_completed {
            info!(
                user_id = %user_id,
                course_id = %module.course_id,
                module = %module.number,
                "module completed"
            );
            match self.awarder.evaluate(user_id).await {
                Ok(badges) => badges,
                Err(error) => {
                    warn!(%error, user_id = %user_id, "badge evaluation failed after completion");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let completed = self.completed_modules(user_id, &module.course_id).await?;
        Ok(CompletionOutcome {
            newly_completed,
            completed,
            new_badges,
        })
    }

    /// Module numbers of `course_id` completed by `user_id`.
    pub async fn completed_modules(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<BTreeSet<ModuleNumber>, Error> {
        let rows = self
            .progress
            .list_for_course(user_id, course_id)
            .await
            .map_err(map_progress_error)?;
        Ok(rows.into_iter().map(|row| row.module_number).collect())
    }

    pub async fn is_course_complete(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<bool, Error> {
        let completed = self.completed_modules(user_id, course_id).await?;
        Ok(is_course_complete(completed.len()))
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
