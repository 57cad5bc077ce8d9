//! Tests for the exam registry, grading hand-off, and expiry sweep.

use std::sync::Mutex as StdMutex;

use chrono::{Duration as ChronoDuration, Local};
use uuid::Uuid;

use super::*;
use crate::domain::ports::{
    CertificateRepositoryError, MockAnswerGrader, MockCertificateNotifier,
    MockCertificateRepository, MockCourseRepository, MockProfileRepository,
    MockProgressRepository, MockQuizRepository, MockResultRepository, ProfileRepositoryError,
    ResultRepositoryError,
};
use crate::domain::test_fixtures::{
    fixture_clock, fixture_timestamp, idle_awarder, module_quiz, sample_course, sample_module,
};
use crate::domain::{
    Certificate, ErrorCode, ExamPhase, ExamStatus, ModuleCompletion, ModuleNumber, Quiz,
    EXAM_DURATION_SECS,
};

struct SteppingClock(StdMutex<DateTime<Utc>>);

impl SteppingClock {
    fn advance_seconds(&self, seconds: i64) {
        let mut now = self.0.lock().expect("clock lock");
        *now += ChronoDuration::seconds(seconds);
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock lock")
    }
}

struct Mocks {
    course: Course,
    progress: MockProgressRepository,
    quizzes: MockQuizRepository,
    results: MockResultRepository,
    grader: MockAnswerGrader,
    certificates: MockCertificateRepository,
    profiles: MockProfileRepository,
    notifier: MockCertificateNotifier,
}

impl Mocks {
    fn new() -> Self {
        Self {
            course: sample_course(),
            progress: MockProgressRepository::new(),
            quizzes: MockQuizRepository::new(),
            results: MockResultRepository::new(),
            grader: MockAnswerGrader::new(),
            certificates: MockCertificateRepository::new(),
            profiles: MockProfileRepository::new(),
            notifier: MockCertificateNotifier::new(),
        }
    }

    fn with_completed_modules(mut self, count: i64) -> Self {
        let course_id = self.course.id;
        let rows: Vec<ModuleCompletion> = (1..=count)
            .map(|n| {
                let module = sample_module(course_id, n);
                ModuleCompletion {
                    module_id: module.id,
                    course_id,
                    module_number: module.number,
                    completed_at: fixture_timestamp(),
                }
            })
            .collect();
        self.progress
            .expect_list_for_course()
            .returning(move |_, _| Ok(rows.clone()));
        self
    }

    /// One quiz per module with two multiple-choice questions and no open
    /// ones, so grading never calls out.
    fn with_module_quizzes(mut self, modules: i64) -> Self {
        let course_id = self.course.id;
        let quizzes: Vec<(ModuleNumber, Quiz)> = (1..=modules)
            .map(|n| {
                let module = sample_module(course_id, n);
                (module.number, module_quiz(&module, 2, 0))
            })
            .collect();
        self.quizzes
            .expect_latest_module_quizzes()
            .returning(move |_| Ok(quizzes.clone()));
        self.quizzes
            .expect_ensure_certification_quiz()
            .returning(|_| Ok(crate::domain::QuizId::random()));
        self
    }

    /// One multiple-choice and one open question per module, every open
    /// answer graded full marks.
    fn with_gradable_quizzes(mut self) -> Self {
        let course_id = self.course.id;
        let quizzes: Vec<(ModuleNumber, Quiz)> = (1..=10)
            .map(|n| {
                let module = sample_module(course_id, n);
                (module.number, module_quiz(&module, 1, 1))
            })
            .collect();
        self.quizzes
            .expect_latest_module_quizzes()
            .return_once(move |_| Ok(quizzes));
        self.quizzes
            .expect_ensure_certification_quiz()
            .return_once(|_| Ok(crate::domain::QuizId::random()));
        self.grader
            .expect_grade()
            .times(1)
            .return_once(|items| Ok(vec![5; items.len()]));
        self.results
            .expect_insert()
            .times(1)
            .return_once(|_| Ok(Uuid::nil()));
        self
    }

    fn build(self) -> (ExamService, Arc<SteppingClock>) {
        let clock = Arc::new(SteppingClock(StdMutex::new(fixture_timestamp())));
        let mut courses = MockCourseRepository::new();
        let course = self.course.clone();
        courses
            .expect_find_by_slug()
            .returning(move |_| Ok(Some(course.clone())));

        let quizzes: Arc<dyn QuizRepository> = Arc::new(self.quizzes);
        let tracker = Arc::new(ProgressTracker::new(
            Arc::new(self.progress),
            idle_awarder(),
            fixture_clock(),
        ));
        let scoring = Arc::new(ScoringService::new(
            Arc::clone(&quizzes),
            Arc::new(crate::domain::ports::FixtureModuleRepository),
            Arc::new(self.results),
            Arc::new(self.grader),
            Arc::clone(&tracker),
            fixture_clock(),
        ));
        let issuer = Arc::new(CertificateIssuer::new(
            Arc::new(self.certificates),
            Arc::new(self.profiles),
            idle_awarder(),
            fixture_clock(),
            "https://skillflash.test",
        ));
        let service = ExamService::new(ExamServicePorts {
            courses: Arc::new(courses),
            quizzes,
            tracker,
            scoring,
            issuer,
            notifier: Arc::new(self.notifier),
            clock: Arc::clone(&clock) as Arc<dyn Clock>,
        });
        (service, clock)
    }
}

fn request() -> ExamRequest {
    ExamRequest::new(UserId::random(), "rust-basics")
}

async fn answer_mixed_exam(service: &ExamService, request: &ExamRequest) {
    answer_everything(service, request, 10, 10).await;
    service.next(request).await.expect("into open section");
    for index in 0..10 {
        service
            .answer(
                request,
                ExamAnswer::Open {
                    text: format!("answer {index}"),
                },
            )
            .await
            .expect("open answer");
        if index < 9 {
            service.next(request).await.expect("advance");
        }
    }
}

async fn answer_everything(
    service: &ExamService,
    request: &ExamRequest,
    total: usize,
    right: usize,
) {
    for index in 0..total {
        let option = if index < right { 1 } else { 0 };
        service
            .answer(request, ExamAnswer::Qcm { option })
            .await
            .expect("answer recorded");
        if index + 1 < total {
            service.next(request).await.expect("advance");
        }
    }
}

#[tokio::test]
async fn start_requires_a_completed_course() {
    let (service, _clock) = Mocks::new().with_completed_modules(9).build();
    let err = service.start(&request()).await.expect_err("course incomplete");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn start_requires_generated_questions() {
    let (service, _clock) = Mocks::new()
        .with_completed_modules(10)
        .with_module_quizzes(0)
        .build();
    let err = service.start(&request()).await.expect_err("no questions");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn view_before_start_shows_intro() {
    let (service, _clock) = Mocks::new().build();
    let view = service.view(&request()).await.expect("view");
    assert_eq!(view.phase, ExamPhase::Intro);
    assert_eq!(view.status, ExamStatus::NotStarted);
}

#[tokio::test]
async fn qcm_only_exam_cannot_reach_the_pass_mark() {
    let mut mocks = Mocks::new()
        .with_completed_modules(10)
        .with_module_quizzes(10);
    mocks
        .results
        .expect_insert()
        .withf(|attempt| attempt.score == 63.0)
        .times(1)
        .return_once(|_| Ok(Uuid::nil()));
    let (service, _clock) = mocks.build();
    let request = request();

    let view = service.start(&request).await.expect("start");
    assert_eq!(view.qcm_count, 20);
    assert_eq!(view.open_count, 0);
    answer_everything(&service, &request, 20, 18).await;

    let view = service.submit(&request).await.expect("submit");
    assert_eq!(view.phase, ExamPhase::Result);
    assert_eq!(view.passed, Some(false));
}

#[tokio::test]
async fn certificate_follows_a_passing_score() {
    let mut mocks = Mocks::new()
        .with_completed_modules(10)
        .with_gradable_quizzes();
    mocks.certificates.expect_insert().times(1).return_once(|candidate| {
        Ok(Certificate {
            id: Uuid::new_v4(),
            user_id: candidate.user_id.clone(),
            course_id: candidate.course_id,
            score: candidate.score,
            verification_code: candidate.verification_code.clone(),
            created_at: candidate.created_at,
        })
    });
    mocks.profiles.expect_add_points().times(1).return_once(|_, _| Ok(()));
    mocks
        .profiles
        .expect_grant_badges()
        .times(1)
        .return_once(|_, badges, _| Ok(badges.to_vec()));
    mocks
        .notifier
        .expect_certificate_issued()
        .returning(|_| Ok(()));
    let (service, _clock) = mocks.build();
    let request = request();

    service.start(&request).await.expect("start");
    answer_mixed_exam(&service, &request).await;

    let view = service.submit(&request).await.expect("submit");
    assert_eq!(view.status, ExamStatus::Completed);
    assert_eq!(view.passed, Some(true));
    match view.outcome {
        Some(ExamOutcome::Graded {
            scorecard,
            certificate: Some(issued),
        }) => {
            assert_eq!(scorecard.score, 100.0);
            assert!(issued.verification_url.starts_with("https://skillflash.test/verify/SF-"));
        }
        other => panic!("expected a certificate, got {other:?}"),
    }
}

#[tokio::test]
async fn sweep_expires_overdue_sessions_once() {
    let mut mocks = Mocks::new()
        .with_completed_modules(10)
        .with_module_quizzes(10);
    mocks.results.expect_insert().never();
    let (service, clock) = mocks.build();
    let request = request();

    service.start(&request).await.expect("start");
    service
        .answer(&request, ExamAnswer::Qcm { option: 1 })
        .await
        .expect("answer");

    assert_eq!(service.expire_due().await, 0);
    clock.advance_seconds(EXAM_DURATION_SECS);
    assert_eq!(service.expire_due().await, 1);
    assert_eq!(service.expire_due().await, 0);

    let view = service.view(&request).await.expect("view");
    assert_eq!(view.status, ExamStatus::Expired);
    assert!(view.answers.is_empty());
    assert_eq!(view.passed, Some(false));

    let view = service.submit(&request).await.expect("late submit reports result");
    assert_eq!(view.status, ExamStatus::Expired);
}

#[tokio::test]
async fn late_action_lands_on_the_timed_out_result() {
    let (service, clock) = Mocks::new()
        .with_completed_modules(10)
        .with_module_quizzes(10)
        .build();
    let request = request();

    service.start(&request).await.expect("start");
    clock.advance_seconds(EXAM_DURATION_SECS + 30);
    let view = service.next(&request).await.expect("timeout is a state");
    assert_eq!(view.status, ExamStatus::Expired);

    let view = service.retry(&request).await.expect("retry");
    assert_eq!(view.phase, ExamPhase::Intro);
}

#[tokio::test]
async fn rejected_actions_leave_no_session_behind() {
    let (service, _clock) = Mocks::new().build();
    let request = request();

    let err = service.next(&request).await.expect_err("not started");
    assert_eq!(err.code(), ErrorCode::Conflict);
    let err = service.submit(&request).await.expect_err("not started");
    assert_eq!(err.code(), ErrorCode::Conflict);
    service.retry(&request).await.expect("retry from intro");

    assert_eq!(service.live_sessions().await, 0);
}

#[tokio::test]
async fn finished_sessions_are_dropped_after_retention() {
    let (service, clock) = Mocks::new()
        .with_completed_modules(10)
        .with_module_quizzes(10)
        .build();
    let request = request();

    service.start(&request).await.expect("start");
    clock.advance_seconds(EXAM_DURATION_SECS);
    assert_eq!(service.expire_due().await, 1);
    clock.advance_seconds(FINISHED_RETENTION_SECS - 1);
    service.expire_due().await;
    assert_eq!(service.live_sessions().await, 1, "result still viewable");

    clock.advance_seconds(1);
    service.expire_due().await;
    assert_eq!(service.live_sessions().await, 0);
    let view = service.view(&request).await.expect("view");
    assert_eq!(view.phase, ExamPhase::Intro);
}

#[tokio::test]
async fn retry_frees_the_session() {
    let (service, _clock) = Mocks::new()
        .with_completed_modules(10)
        .with_module_quizzes(1)
        .build();
    let request = request();

    service.start(&request).await.expect("start");
    assert_eq!(service.live_sessions().await, 1);
    service.retry(&request).await.expect("retry");
    assert_eq!(service.live_sessions().await, 0);
}

#[tokio::test]
async fn reward_failures_keep_the_issued_certificate() {
    let mut mocks = Mocks::new()
        .with_completed_modules(10)
        .with_gradable_quizzes();
    mocks.certificates.expect_insert().times(1).return_once(|candidate| {
        Ok(Certificate {
            id: Uuid::new_v4(),
            user_id: candidate.user_id.clone(),
            course_id: candidate.course_id,
            score: candidate.score,
            verification_code: candidate.verification_code.clone(),
            created_at: candidate.created_at,
        })
    });
    mocks
        .profiles
        .expect_add_points()
        .times(1)
        .return_once(|_, _| Err(ProfileRepositoryError::connection("down")));
    mocks
        .profiles
        .expect_grant_badges()
        .times(1)
        .return_once(|_, badges, _| Ok(badges.to_vec()));
    mocks
        .notifier
        .expect_certificate_issued()
        .returning(|_| Ok(()));
    let (service, _clock) = mocks.build();
    let request = request();

    service.start(&request).await.expect("start");
    answer_mixed_exam(&service, &request).await;

    let view = service.submit(&request).await.expect("certificate still issued");
    assert_eq!(view.phase, ExamPhase::Result);
    assert!(matches!(
        view.outcome,
        Some(ExamOutcome::Graded {
            certificate: Some(_),
            ..
        })
    ));
}

#[tokio::test]
async fn grading_failure_resets_to_intro() {
    let mut mocks = Mocks::new()
        .with_completed_modules(10)
        .with_module_quizzes(1);
    mocks
        .results
        .expect_insert()
        .times(1)
        .return_once(|_| Err(ResultRepositoryError::connection("down")));
    let (service, _clock) = mocks.build();
    let request = request();

    service.start(&request).await.expect("start");
    answer_everything(&service, &request, 2, 2).await;
    let err = service.submit(&request).await.expect_err("store down");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);

    let view = service.view(&request).await.expect("view");
    assert_eq!(view.phase, ExamPhase::Intro);
}

#[tokio::test]
async fn invalid_answers_are_bad_requests() {
    let (service, _clock) = Mocks::new()
        .with_completed_modules(10)
        .with_module_quizzes(1)
        .build();
    let request = request();

    service.start(&request).await.expect("start");
    let err = service
        .answer(&request, ExamAnswer::Qcm { option: 9 })
        .await
        .expect_err("no such option");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);

    let err = service.submit(&request).await.expect_err("not at the end");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn issuance_failure_resets_the_exam() {
    let mut mocks = Mocks::new()
        .with_completed_modules(10)
        .with_gradable_quizzes();
    mocks.certificates.expect_insert().returning(|candidate| {
        Err(CertificateRepositoryError::duplicate_code(
            candidate.verification_code.to_string(),
        ))
    });
    mocks.profiles.expect_add_points().never();
    mocks.notifier.expect_certificate_issued().never();
    let (service, _clock) = mocks.build();
    let request = request();

    service.start(&request).await.expect("start");
    answer_mixed_exam(&service, &request).await;
    let err = service.submit(&request).await.expect_err("codes exhausted");
    assert_eq!(err.code(), ErrorCode::Conflict);

    let view = service.view(&request).await.expect("view");
    assert_eq!(view.phase, ExamPhase::Intro);
    assert!(view.outcome.is_none());
}
