//! Tests for unlock rules and completion recording.

use std::collections::BTreeSet;
use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::{MockProgressRepository, ProgressRepositoryError};
use crate::domain::test_fixtures::{
    fixture_clock, fixture_timestamp, idle_awarder, module_number, sample_module,
};
use crate::domain::ErrorCode;

fn completed(numbers: &[i64]) -> BTreeSet<ModuleNumber> {
    numbers.iter().map(|n| module_number(*n)).collect()
}

fn completion(module: &Module) -> ModuleCompletion {
    ModuleCompletion {
        module_id: module.id,
        course_id: module.course_id,
        module_number: module.number,
        completed_at: fixture_timestamp(),
    }
}

#[rstest]
#[case(1, &[], true)]
#[case(2, &[], false)]
#[case(2, &[1], true)]
#[case(5, &[1, 2, 3], false)]
#[case(4, &[1, 2, 3], true)]
#[case(10, &[1, 2, 3, 4, 5, 6, 7, 8, 9], true)]
fn authenticated_learners_progress_in_order(
    #[case] number: i64,
    #[case] done: &[i64],
    #[case] expected: bool,
) {
    assert_eq!(
        is_unlocked(module_number(number), &completed(done), true),
        expected
    );
}

#[rstest]
fn anonymous_visitors_preview_everything() {
    let slots = derive_unlock_state(&BTreeSet::new(), false);
    assert_eq!(slots.len(), usize::from(MODULE_COUNT));
    assert!(slots.iter().all(|slot| slot.unlocked && !slot.completed));
}

#[rstest]
fn unlock_state_marks_completed_modules() {
    let slots = derive_unlock_state(&completed(&[1, 2]), true);
    let flags: Vec<(bool, bool)> = slots
        .iter()
        .take(4)
        .map(|slot| (slot.unlocked, slot.completed))
        .collect();
    assert_eq!(
        flags,
        vec![(true, true), (true, true), (true, false), (false, false)]
    );
}

#[rstest]
#[case(9, false)]
#[case(10, true)]
#[case(11, true)]
fn course_completion_needs_every_module(#[case] count: usize, #[case] expected: bool) {
    assert_eq!(is_course_complete(count), expected);
}

#[tokio::test]
async fn first_completion_credits_points_once() {
    let user = UserId::random();
    let module = sample_module(CourseId::random(), 3);
    let row = completion(&module);

    let mut repo = MockProgressRepository::new();
    repo.expect_record_completion()
        .withf(|write| write.points == MODULE_COMPLETION_POINTS)
        .times(1)
        .return_once(|_| Ok(true));
    repo.expect_list_for_course()
        .times(1)
        .return_once(move |_, _| Ok(vec![row]));

    let tracker = ProgressTracker::new(Arc::new(repo), idle_awarder(), fixture_clock());
    let outcome = tracker
        .record_completion(&user, &module)
        .await
        .expect("completion recorded");

    assert!(outcome.newly_completed);
    assert_eq!(outcome.completed, completed(&[3]));
    assert!(outcome.new_badges.is_empty());
}

#[tokio::test]
async fn repeated_completion_is_not_new() {
    let user = UserId::random();
    let module = sample_module(CourseId::random(), 1);
    let row = completion(&module);

    let mut repo = MockProgressRepository::new();
    repo.expect_record_completion()
        .times(1)
        .return_once(|_| Ok(false));
    repo.expect_list_for_course()
        .times(1)
        .return_once(move |_, _| Ok(vec![row]));

    let tracker = ProgressTracker::new(Arc::new(repo), idle_awarder(), fixture_clock());
    let outcome = tracker
        .record_completion(&user, &module)
        .await
        .expect("completion recorded");

    assert!(!outcome.newly_completed);
    assert_eq!(outcome.completed.len(), 1);
}

#[tokio::test]
async fn store_failures_propagate() {
    let module = sample_module(CourseId::random(), 1);
    let mut repo = MockProgressRepository::new();
    repo.expect_record_completion()
        .times(1)
        .return_once(|_| Err(ProgressRepositoryError::connection("down")));

    let tracker = ProgressTracker::new(Arc::new(repo), idle_awarder(), fixture_clock());
    let err = tracker
        .record_completion(&UserId::random(), &module)
        .await
        .expect_err("store down");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[tokio::test]
async fn nine_of_ten_is_not_complete() {
    let course_id = CourseId::random();
    let rows: Vec<ModuleCompletion> = (1..=9)
        .map(|n| completion(&sample_module(course_id, n)))
        .collect();
    let mut repo = MockProgressRepository::new();
    repo.expect_list_for_course()
        .times(1)
        .return_once(move |_, _| Ok(rows));

    let tracker = ProgressTracker::new(Arc::new(repo), idle_awarder(), fixture_clock());
    let complete = tracker
        .is_course_complete(&UserId::random(), &course_id)
        .await
        .expect("read progress");
    assert!(!complete);
}
