//! Builders wiring repositories, AI adapters, and domain services into the
//! HTTP state.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use crate::domain::ports::{
    AnswerGrader, CertificateNotifier, CertificateRepository, ContentGenerator, CourseRepository,
    FixtureAnswerGrader, FixtureCertificateRepository, FixtureContentGenerator,
    FixtureCourseRepository, FixtureLoginService, FixtureModuleRepository,
    FixtureProfileRepository, FixtureProgressRepository, FixtureQuizRepository,
    FixtureResultRepository, ModuleRepository, ProfileRepository, ProgressRepository,
    QuizRepository, ResultRepository,
};
use crate::domain::{
    BadgeAwarder, CatalogueService, CertificateIssuer, ExamService, ExamServicePorts,
    ModuleContentService, ProfileService, ProgressTracker, ScoringService,
};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::ai::{ChatClientConfig, ChatClientError, ChatCompletionsClient};
use crate::outbound::notify::TracingCertificateNotifier;
use crate::outbound::persistence::{
    DbPool, DieselCertificateRepository, DieselCourseRepository, DieselModuleRepository,
    DieselProfileRepository, DieselProgressRepository, DieselQuizRepository,
    DieselResultRepository,
};

/// Driven ports backing every learning service.
#[derive(Clone)]
pub struct LearningPorts {
    pub courses: Arc<dyn CourseRepository>,
    pub modules: Arc<dyn ModuleRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub results: Arc<dyn ResultRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub certificates: Arc<dyn CertificateRepository>,
    pub generator: Arc<dyn ContentGenerator>,
    pub grader: Arc<dyn AnswerGrader>,
    pub notifier: Arc<dyn CertificateNotifier>,
    pub clock: Arc<dyn Clock>,
}

impl LearningPorts {
    /// In-process fixtures: an empty catalogue and no AI provider.
    #[must_use]
    pub fn fixtures() -> Self {
        Self {
            courses: Arc::new(FixtureCourseRepository),
            modules: Arc::new(FixtureModuleRepository),
            quizzes: Arc::new(FixtureQuizRepository),
            results: Arc::new(FixtureResultRepository),
            progress: Arc::new(FixtureProgressRepository),
            profiles: Arc::new(FixtureProfileRepository),
            certificates: Arc::new(FixtureCertificateRepository),
            generator: Arc::new(FixtureContentGenerator),
            grader: Arc::new(FixtureAnswerGrader),
            notifier: Arc::new(TracingCertificateNotifier),
            clock: Arc::new(DefaultClock),
        }
    }

    /// Diesel repositories over `pool`; AI ports stay on fixtures.
    #[must_use]
    pub fn with_pool(pool: &DbPool) -> Self {
        Self {
            courses: Arc::new(DieselCourseRepository::new(pool.clone())),
            modules: Arc::new(DieselModuleRepository::new(pool.clone())),
            quizzes: Arc::new(DieselQuizRepository::new(pool.clone())),
            results: Arc::new(DieselResultRepository::new(pool.clone())),
            progress: Arc::new(DieselProgressRepository::new(pool.clone())),
            profiles: Arc::new(DieselProfileRepository::new(pool.clone())),
            certificates: Arc::new(DieselCertificateRepository::new(pool.clone())),
            ..Self::fixtures()
        }
    }

    /// Route generation and grading through one chat client.
    ///
    /// # Errors
    ///
    /// Returns [`ChatClientError`] when the client cannot be built.
    pub fn with_ai(mut self, config: ChatClientConfig) -> Result<Self, ChatClientError> {
        let client = Arc::new(ChatCompletionsClient::new(config)?);
        self.generator = client.clone();
        self.grader = client;
        Ok(self)
    }
}

/// Services assembled from [`LearningPorts`].
pub struct LearningServices {
    pub http_state: HttpState,
    /// Kept apart from the state so the server can run its sweeper.
    pub exams: Arc<ExamService>,
}

/// Assemble every domain service and expose them as HTTP state.
#[must_use]
pub fn build_learning_services(ports: LearningPorts, public_base_url: &str) -> LearningServices {
    let LearningPorts {
        courses,
        modules,
        quizzes,
        results,
        progress,
        profiles,
        certificates,
        generator,
        grader,
        notifier,
        clock,
    } = ports;

    let awarder = Arc::new(BadgeAwarder::new(
        profiles.clone(),
        progress.clone(),
        certificates.clone(),
        clock.clone(),
    ));
    let tracker = Arc::new(ProgressTracker::new(progress, awarder.clone(), clock.clone()));
    let scoring = Arc::new(ScoringService::new(
        quizzes.clone(),
        modules.clone(),
        results,
        grader,
        tracker.clone(),
        clock.clone(),
    ));
    let issuer = Arc::new(CertificateIssuer::new(
        certificates,
        profiles.clone(),
        awarder,
        clock.clone(),
        public_base_url,
    ));
    let exams = Arc::new(ExamService::new(ExamServicePorts {
        courses: courses.clone(),
        quizzes: quizzes.clone(),
        tracker: tracker.clone(),
        scoring: scoring.clone(),
        issuer: issuer.clone(),
        notifier,
        clock,
    }));

    let http_state = HttpState::new(HttpStatePorts {
        login: Arc::new(FixtureLoginService),
        catalogue: Arc::new(CatalogueService::new(courses.clone(), tracker.clone())),
        modules: Arc::new(ModuleContentService::new(
            courses, modules, quizzes, generator, tracker,
        )),
        quizzes: scoring,
        exams: exams.clone(),
        certificates: issuer,
        profiles: Arc::new(ProfileService::new(profiles)),
    });

    LearningServices { http_state, exams }
}

/// Choose ports from the server configuration.
pub(super) fn build_learning_ports(
    db_pool: Option<&DbPool>,
    ai: Option<ChatClientConfig>,
) -> Result<LearningPorts, ChatClientError> {
    let ports = db_pool.map_or_else(LearningPorts::fixtures, LearningPorts::with_pool);
    match ai {
        Some(config) => ports.with_ai(config),
        None => Ok(ports),
    }
}
