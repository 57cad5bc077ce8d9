//! Shared builders and doubles for domain unit tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use super::ports::{
    FixtureCertificateRepository, FixtureProfileRepository, FixtureProgressRepository,
};
use super::{
    BadgeAwarder, Course, CourseId, CourseLevel, Module, ModuleContent, ModuleExercise, ModuleId,
    ModuleNumber, OpenQuestion, QcmQuestion, QuestionSet, Quiz, QuizId, QuizType,
};

pub(crate) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 24, 10, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub(crate) struct FixtureClock {
    pub(crate) utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    clock_at(fixture_timestamp())
}

pub(crate) fn clock_at(utc_now: DateTime<Utc>) -> Arc<dyn Clock> {
    Arc::new(FixtureClock { utc_now })
}

pub(crate) fn sample_course() -> Course {
    Course {
        id: CourseId::random(),
        slug: "rust-basics".to_owned(),
        title: "Rust Basics".to_owned(),
        description: "Ownership, borrowing, and traits.".to_owned(),
        level: CourseLevel::Beginner,
        skills: vec!["ownership".to_owned()],
        duration: "5h".to_owned(),
        icon: "crab".to_owned(),
    }
}

pub(crate) fn module_number(value: i64) -> ModuleNumber {
    ModuleNumber::new(value).expect("valid module number")
}

pub(crate) fn sample_module(course_id: CourseId, number: i64) -> Module {
    Module {
        id: ModuleId::random(),
        course_id,
        number: module_number(number),
        title: format!("Module {number}"),
        content: ModuleContent {
            explanation: "Values have a single owner.".to_owned(),
            examples: Vec::new(),
            exercise: ModuleExercise {
                title: "Move a value".to_owned(),
                description: "Pass a String into a function.".to_owned(),
                hint: None,
            },
        },
    }
}

/// Three-option question whose correct option is index 1.
pub(crate) fn qcm(label: &str) -> QcmQuestion {
    QcmQuestion::new(
        label,
        vec!["wrong".to_owned(), "right".to_owned(), "also wrong".to_owned()],
        1,
    )
    .expect("valid question")
}

pub(crate) fn open(label: &str) -> OpenQuestion {
    OpenQuestion {
        question: label.to_owned(),
        expected_answer: format!("reference for {label}"),
    }
}

pub(crate) fn module_quiz(module: &Module, qcm_count: usize, open_count: usize) -> Quiz {
    Quiz {
        id: QuizId::random(),
        module_id: Some(module.id),
        course_id: Some(module.course_id),
        quiz_type: QuizType::Module,
        questions: QuestionSet {
            qcm: (0..qcm_count)
                .map(|i| qcm(&format!("m{} q{i}", module.number)))
                .collect(),
            open: (0..open_count)
                .map(|i| open(&format!("m{} o{i}", module.number)))
                .collect(),
        },
    }
}

/// Awarder backed by empty fixture repositories; evaluates to no badges.
pub(crate) fn idle_awarder() -> Arc<BadgeAwarder> {
    Arc::new(BadgeAwarder::new(
        Arc::new(FixtureProfileRepository),
        Arc::new(FixtureProgressRepository),
        Arc::new(FixtureCertificateRepository),
        fixture_clock(),
    ))
}
