//! Registry of live certification exams and the actions that drive them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::assembly::assemble_questions;
use super::session::{
    ExamAnswer, ExamError, ExamOutcome, ExamPhase, ExamSession, ExamView, SubmittedExam,
};
use crate::domain::port_error_mapping::{map_course_error, map_quiz_error};
use crate::domain::ports::{
    CertificateNotice, CertificateNotifier, CertificationExam, CourseRepository, ExamRequest,
    QuizRepository,
};
use crate::domain::{
    CertificateIssuer, Course, CourseId, Error, IssuedCertificate, ProgressTracker,
    ScoringService, TraceId, UserId,
};

/// How often the sweeper looks for overdue sessions.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// How long a finished exam stays viewable before the sweeper drops it.
pub const FINISHED_RETENTION_SECS: i64 = 24 * 60 * 60;

/// Collaborators of [`ExamService`].
pub struct ExamServicePorts {
    pub courses: Arc<dyn CourseRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub tracker: Arc<ProgressTracker>,
    pub scoring: Arc<ScoringService>,
    pub issuer: Arc<CertificateIssuer>,
    pub notifier: Arc<dyn CertificateNotifier>,
    pub clock: Arc<dyn Clock>,
}

type SessionKey = (UserId, CourseId);

/// Holds at most one session per learner and course.
///
/// Sessions live in memory only. Nothing about an unfinished attempt is
/// persisted, so a restart simply discards them.
pub struct ExamService {
    ports: ExamServicePorts,
    sessions: Mutex<HashMap<SessionKey, ExamSession>>,
}

impl ExamService {
    pub fn new(ports: ExamServicePorts) -> Self {
        Self {
            ports,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Force the timeout transition on every overdue session and drop
    /// sessions finished more than [`FINISHED_RETENTION_SECS`] ago.
    ///
    /// Returns how many sessions expired during this sweep.
    pub async fn expire_due(&self) -> usize {
        let now = self.ports.clock.utc();
        let cutoff = now - chrono::Duration::seconds(FINISHED_RETENTION_SECS);
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, session| !session.finished_before(cutoff));
        let mut expired = 0;
        for session in sessions.values_mut() {
            if session.expire_if_due(now) {
                expired += 1;
                info!(
                    user_id = %session.user_id(),
                    course_id = %session.course_id(),
                    "certification exam timed out"
                );
            }
        }
        expired
    }

    /// Number of sessions currently held in memory.
    pub async fn live_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn course(&self, slug: &str) -> Result<Course, Error> {
        self.ports
            .courses
            .find_by_slug(slug)
            .await
            .map_err(map_course_error)?
            .ok_or_else(|| Error::not_found(format!("course {slug} not found")))
    }

    async fn act<F>(&self, request: &ExamRequest, action: F) -> Result<ExamView, Error>
    where
        F: FnOnce(&mut ExamSession, DateTime<Utc>) -> Result<(), ExamError> + Send,
    {
        let course = self.course(&request.course_slug).await?;
        let now = self.ports.clock.utc();
        let key = (request.user_id.clone(), course.id);
        let mut sessions = self.sessions.lock().await;
        let mut session = sessions
            .remove(&key)
            .unwrap_or_else(|| ExamSession::new(request.user_id.clone(), course.id));
        let result = action(&mut session, now);
        let view = session.view(now);
        // A session in `intro` holds nothing worth keeping.
        if session.phase() != ExamPhase::Intro {
            sessions.insert(key, session);
        }
        match result {
            Ok(()) => Ok(view),
            Err(ExamError::TimedOut) => {
                warn!(
                    user_id = %request.user_id,
                    course = %course.slug,
                    "exam action after deadline"
                );
                Ok(view)
            }
            Err(error) => Err(map_exam_error(error)),
        }
    }

    async fn grade(
        &self,
        user_id: &UserId,
        course: &Course,
        exam: &SubmittedExam,
    ) -> Result<ExamOutcome, Error> {
        let scorecard = self
            .ports
            .scoring
            .score_certification(user_id, course, exam)
            .await?;
        if !scorecard.passed {
            return Ok(ExamOutcome::Graded {
                scorecard,
                certificate: None,
            });
        }
        let issued = self
            .ports
            .issuer
            .issue(user_id, course, scorecard.score)
            .await?;
        self.notify(user_id, course, &issued);
        Ok(ExamOutcome::Graded {
            scorecard,
            certificate: Some(issued),
        })
    }

    /// Dispatch the certificate notice in the background. Failures are only
    /// logged.
    fn notify(&self, user_id: &UserId, course: &Course, issued: &IssuedCertificate) {
        let notice = CertificateNotice {
            user_id: user_id.clone(),
            course_id: course.id,
            course_title: course.title.clone(),
            verification_code: issued.verification_code.clone(),
            verification_url: issued.verification_url.clone(),
        };
        let notifier = Arc::clone(&self.ports.notifier);
        let task = async move {
            if let Err(error) = notifier.certificate_issued(&notice).await {
                warn!(%error, code = %notice.verification_code, "certificate notification failed");
            }
        };
        let _detached = TraceId::spawn_in_scope(task);
    }
}

fn map_exam_error(error: ExamError) -> Error {
    match error {
        ExamError::InvalidOption { .. } | ExamError::AnswerMismatch => {
            Error::invalid_request(error.to_string())
        }
        other => Error::conflict(other.to_string()),
    }
}

#[async_trait]
impl CertificationExam for ExamService {
    async fn view(&self, request: &ExamRequest) -> Result<ExamView, Error> {
        let course = self.course(&request.course_slug).await?;
        let now = self.ports.clock.utc();
        let mut sessions = self.sessions.lock().await;
        let view = match sessions.get_mut(&(request.user_id.clone(), course.id)) {
            Some(session) => {
                session.expire_if_due(now);
                session.view(now)
            }
            None => ExamSession::new(request.user_id.clone(), course.id).view(now),
        };
        Ok(view)
    }

    async fn start(&self, request: &ExamRequest) -> Result<ExamView, Error> {
        let course = self.course(&request.course_slug).await?;
        if !self
            .ports
            .tracker
            .is_course_complete(&request.user_id, &course.id)
            .await?
        {
            return Err(Error::forbidden(
                "complete every module of the course before taking the certification",
            ));
        }
        let quizzes = self
            .ports
            .quizzes
            .latest_module_quizzes(&course.id)
            .await
            .map_err(map_quiz_error)?;
        let questions = assemble_questions(&quizzes);
        let view = self
            .act(request, move |session, now| session.start(questions, now))
            .await?;
        info!(
            user_id = %request.user_id,
            course = %course.slug,
            qcm = view.qcm_count,
            open = view.open_count,
            "certification exam started"
        );
        Ok(view)
    }

    async fn answer(&self, request: &ExamRequest, answer: ExamAnswer) -> Result<ExamView, Error> {
        self.act(request, move |session, now| session.answer(answer, now))
            .await
    }

    async fn next(&self, request: &ExamRequest) -> Result<ExamView, Error> {
        self.act(request, |session, now| session.next(now)).await
    }

    async fn previous(&self, request: &ExamRequest) -> Result<ExamView, Error> {
        self.act(request, |session, now| session.previous(now)).await
    }

    async fn submit(&self, request: &ExamRequest) -> Result<ExamView, Error> {
        let course = self.course(&request.course_slug).await?;
        let key = (request.user_id.clone(), course.id);
        let now = self.ports.clock.utc();
        let submitted = {
            let mut sessions = self.sessions.lock().await;
            let Some(session) = sessions.get_mut(&key) else {
                return Err(map_exam_error(ExamError::NotStarted));
            };
            match session.submit(now) {
                Ok(submitted) => submitted,
                Err(ExamError::TimedOut) => return Ok(session.view(now)),
                Err(error) => return Err(map_exam_error(error)),
            }
        };

        // Grading runs without the registry lock; the session sits in
        // `grading` meanwhile and refuses every other action.
        let outcome = self.grade(&request.user_id, &course, &submitted).await;

        let now = self.ports.clock.utc();
        let mut sessions = self.sessions.lock().await;
        let mut session = sessions
            .remove(&key)
            .unwrap_or_else(|| ExamSession::new(request.user_id.clone(), course.id));
        let result = match outcome {
            Ok(outcome) => {
                session.complete(outcome, now);
                Ok(session.view(now))
            }
            Err(error) => {
                warn!(
                    %error,
                    user_id = %request.user_id,
                    course = %course.slug,
                    "certification grading failed; exam reset"
                );
                session.abandon_grading();
                Err(error)
            }
        };
        if session.phase() != ExamPhase::Intro {
            sessions.insert(key, session);
        }
        result
    }

    async fn retry(&self, request: &ExamRequest) -> Result<ExamView, Error> {
        self.act(request, |session, _now| session.retry()).await
    }
}

/// Run [`ExamService::expire_due`] every [`SWEEP_INTERVAL`] until the
/// runtime shuts down.
pub fn spawn_exam_sweeper(service: Arc<ExamService>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            service.expire_due().await;
        }
    })
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
