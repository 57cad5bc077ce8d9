//! Certificate issuance and badge evaluation against the in-memory store:
//! repeated calls never grant a badge twice.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use mockable::Clock;
use skillflash::domain::{
    Badge, BadgeAwarder, CERTIFICATE_BONUS_POINTS, CertificateIssuer, Course, CourseId,
    CourseLevel, ModuleNumber, UserId,
};
use skillflash::test_support::{InMemoryStore, MutableClock, sample_questions};

fn issued_on() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 14, 10, 30, 0)
        .single()
        .expect("valid timestamp")
}

fn course() -> Course {
    Course {
        id: CourseId::random(),
        slug: "rust-basics".to_owned(),
        title: "Rust Basics".to_owned(),
        description: "Ownership, borrowing, and traits.".to_owned(),
        level: CourseLevel::Beginner,
        skills: vec!["ownership".to_owned()],
        duration: "10 hours".to_owned(),
        icon: "crab".to_owned(),
    }
}

fn awarder(store: &Arc<InMemoryStore>, clock: &Arc<MutableClock>) -> Arc<BadgeAwarder> {
    Arc::new(BadgeAwarder::new(
        store.clone(),
        store.clone(),
        store.clone(),
        clock.clone() as Arc<dyn Clock>,
    ))
}

#[tokio::test]
async fn issuing_twice_grants_certified_once() {
    let store = InMemoryStore::new();
    let course = course();
    store.add_course(course.clone());
    let clock = Arc::new(MutableClock::new(issued_on()));
    let issuer = CertificateIssuer::new(
        store.clone(),
        store.clone(),
        awarder(&store, &clock),
        clock.clone() as Arc<dyn Clock>,
        "https://learn.example",
    );
    let learner = UserId::random();

    let first = issuer
        .issue(&learner, &course, 85.0)
        .await
        .expect("first issuance");
    let second = issuer
        .issue(&learner, &course, 85.0)
        .await
        .expect("second issuance retries the colliding code");

    assert_eq!(first.new_badges, vec![Badge::Certified]);
    assert!(second.new_badges.is_empty());
    assert_ne!(first.verification_code, second.verification_code);
    assert_eq!(store.certificate_count(), 2);
    let profile = store.stored_profile(&learner).expect("profile created");
    assert_eq!(
        profile
            .badges
            .iter()
            .filter(|badge| **badge == Badge::Certified)
            .count(),
        1
    );
    assert_eq!(profile.points, 2 * CERTIFICATE_BONUS_POINTS);
}

#[tokio::test]
async fn repeated_evaluation_grants_nothing_new() {
    let store = InMemoryStore::new();
    let course = course();
    store.add_course(course.clone());
    let clock = Arc::new(MutableClock::new(issued_on()));
    let learner = UserId::random();
    let (module, _) =
        store.add_module_with_quiz(course.id, ModuleNumber::FIRST, sample_questions("m1", 3, 1));
    store.complete_module(&learner, &module, issued_on());
    let awarder = awarder(&store, &clock);

    let first = awarder.evaluate(&learner).await.expect("first evaluation");
    let after_first = store.stored_profile(&learner).expect("profile created");
    let second = awarder.evaluate(&learner).await.expect("second evaluation");
    let third = awarder.evaluate(&learner).await.expect("third evaluation");

    assert_eq!(first, vec![Badge::FirstSteps]);
    assert!(second.is_empty());
    assert!(third.is_empty());
    assert_eq!(store.stored_profile(&learner), Some(after_first));
}
