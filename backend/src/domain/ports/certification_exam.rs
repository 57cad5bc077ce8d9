//! Driving port for the timed certification exam.

use async_trait::async_trait;

use crate::domain::{Error, ExamAnswer, ExamView, UserId};

/// Identifies one learner's exam for one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamRequest {
    pub user_id: UserId,
    pub course_slug: String,
}

impl ExamRequest {
    pub fn new(user_id: UserId, course_slug: impl Into<String>) -> Self {
        Self {
            user_id,
            course_slug: course_slug.into(),
        }
    }
}

/// Every action returns the resulting view. An action that lands on an
/// expired session reports the timed-out result instead of failing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificationExam: Send + Sync {
    async fn view(&self, request: &ExamRequest) -> Result<ExamView, Error>;
    async fn start(&self, request: &ExamRequest) -> Result<ExamView, Error>;
    async fn answer(&self, request: &ExamRequest, answer: ExamAnswer) -> Result<ExamView, Error>;
    async fn next(&self, request: &ExamRequest) -> Result<ExamView, Error>;
    async fn previous(&self, request: &ExamRequest) -> Result<ExamView, Error>;
    async fn submit(&self, request: &ExamRequest) -> Result<ExamView, Error>;
    async fn retry(&self, request: &ExamRequest) -> Result<ExamView, Error>;
}

/// Fixture implementation for deployments without a course catalogue.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCertificationExam;

impl FixtureCertificationExam {
    fn missing(request: &ExamRequest) -> Error {
        Error::not_found(format!("course {} not found", request.course_slug))
    }
}

#[async_trait]
impl CertificationExam for FixtureCertificationExam {
    async fn view(&self, request: &ExamRequest) -> Result<ExamView, Error> {
        Err(Self::missing(request))
    }

    async fn start(&self, request: &ExamRequest) -> Result<ExamView, Error> {
        Err(Self::missing(request))
    }

    async fn answer(&self, request: &ExamRequest, _answer: ExamAnswer) -> Result<ExamView, Error> {
        Err(Self::missing(request))
    }

    async fn next(&self, request: &ExamRequest) -> Result<ExamView, Error> {
        Err(Self::missing(request))
    }

    async fn previous(&self, request: &ExamRequest) -> Result<ExamView, Error> {
        Err(Self::missing(request))
    }

    async fn submit(&self, request: &ExamRequest) -> Result<ExamView, Error> {
        Err(Self::missing(request))
    }

    async fn retry(&self, request: &ExamRequest) -> Result<ExamView, Error> {
        Err(Self::missing(request))
    }
}
