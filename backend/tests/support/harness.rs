//! Shared harness for HTTP integration suites.
//!
//! Builds the full application over [`InMemoryStore`] with scripted AI
//! doubles and a [`MutableClock`], then offers small helpers for logging
//! in and exchanging JSON with the in-process service.

use std::sync::Arc;

use actix_http::Request;
use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use skillflash::domain::ports::{AnswerGrader, ContentGenerator};
use skillflash::domain::{Course, CourseId, CourseLevel, ExamService, ModuleNumber, UserId};
use skillflash::inbound::http::health::HealthState;
use skillflash::server::{AppDependencies, LearningServices, build_learning_services};
use skillflash::test_support::{
    InMemoryStore, MutableClock, ScriptedGenerator, ScriptedGrader, sample_questions,
};

pub const ADA_ID: &str = "6d1f0c1e-4a8e-4c1a-9d7e-2b8f3a9c5e01";
pub const GRACE_ID: &str = "a3c2b7d4-51e6-4f08-8b3a-7c9d0e1f2a02";
pub const COURSE_SLUG: &str = "rust-basics";
pub const BASE_URL: &str = "https://learn.example";

pub fn start_of_term() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn rust_course() -> Course {
    Course {
        id: CourseId::random(),
        slug: COURSE_SLUG.to_owned(),
        title: "Rust Basics".to_owned(),
        description: "Ownership, borrowing, and traits.".to_owned(),
        level: CourseLevel::Beginner,
        skills: vec!["ownership".to_owned()],
        duration: "10 hours".to_owned(),
        icon: "crab".to_owned(),
    }
}

pub fn user(id: &str) -> UserId {
    UserId::new(id).expect("demo learner id")
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<MutableClock>,
    pub generator: Arc<ScriptedGenerator>,
    pub course: Course,
    pub exams: Arc<ExamService>,
    deps: AppDependencies,
}

impl Harness {
    /// One seeded course, a working generator, and a grader awarding full
    /// marks.
    pub fn new() -> Self {
        Self::with_ai(ScriptedGenerator::default(), ScriptedGrader::awarding(5))
    }

    pub fn with_ai(generator: ScriptedGenerator, grader: ScriptedGrader) -> Self {
        let store = InMemoryStore::new();
        let course = rust_course();
        store.add_course(course.clone());
        let clock = Arc::new(MutableClock::new(start_of_term()));
        let generator = Arc::new(generator);
        let ports = store.ports(
            generator.clone() as Arc<dyn ContentGenerator>,
            Arc::new(grader) as Arc<dyn AnswerGrader>,
            clock.clone(),
        );
        let LearningServices { http_state, exams } = build_learning_services(ports, BASE_URL);
        let deps = AppDependencies {
            health_state: web::Data::new(HealthState::new()),
            http_state: web::Data::new(http_state),
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        };
        Self {
            store,
            clock,
            generator,
            course,
            exams,
            deps,
        }
    }

    pub fn deps(&self) -> AppDependencies {
        self.deps.clone()
    }

    /// Store all ten modules with quizzes and mark them completed for
    /// `user_id`, one day apart.
    pub fn complete_course(&self, user_id: &UserId, qcm_per_module: usize) {
        for (offset, number) in (0_i64..).zip(ModuleNumber::all()) {
            let (module, _) = self.store.add_module_with_quiz(
                self.course.id,
                number,
                sample_questions(&format!("m{number}"), qcm_per_module, 1),
            );
            let completed_at = start_of_term() - chrono::TimeDelta::days(20 - offset);
            self.store.complete_module(user_id, &module, completed_at);
        }
    }
}

/// Status and parsed body; empty bodies parse as `Value::Null`.
pub async fn send<S>(app: &S, request: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(app, request).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

/// Log in as a demo learner and return the session cookie.
pub async fn login<S>(app: &S, username: &str, password: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "username": username, "password": password }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK, "login as {username}");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}

pub fn get(uri: &str, cookie: &Cookie<'static>) -> Request {
    test::TestRequest::get()
        .uri(uri)
        .cookie(cookie.clone())
        .to_request()
}

pub fn post(uri: &str, cookie: &Cookie<'static>, body: Option<Value>) -> Request {
    let request = test::TestRequest::post().uri(uri).cookie(cookie.clone());
    match body {
        Some(body) => request.set_json(body).to_request(),
        None => request.to_request(),
    }
}

pub fn put(uri: &str, cookie: &Cookie<'static>, body: Value) -> Request {
    test::TestRequest::put()
        .uri(uri)
        .cookie(cookie.clone())
        .set_json(body)
        .to_request()
}
