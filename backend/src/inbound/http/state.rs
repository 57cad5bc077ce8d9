//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    CatalogueQuery, CertificateVerification, CertificationExam, FixtureCatalogueQuery,
    FixtureCertificateVerification, FixtureCertificationExam, FixtureLoginService,
    FixtureModuleContentQuery, FixtureProfileQuery, FixtureQuizEvaluation, LoginService,
    ModuleContentQuery, ProfileQuery, QuizEvaluation,
};

/// Parameter object bundling all port implementations for HTTP handlers.
///
/// The [`Default`] bundle wires every port to its fixture, which keeps
/// handler tests down to the one port they exercise.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub catalogue: Arc<dyn CatalogueQuery>,
    pub modules: Arc<dyn ModuleContentQuery>,
    pub quizzes: Arc<dyn QuizEvaluation>,
    pub exams: Arc<dyn CertificationExam>,
    pub certificates: Arc<dyn CertificateVerification>,
    pub profiles: Arc<dyn ProfileQuery>,
}

impl Default for HttpStatePorts {
    fn default() -> Self {
        Self {
            login: Arc::new(FixtureLoginService),
            catalogue: Arc::new(FixtureCatalogueQuery),
            modules: Arc::new(FixtureModuleContentQuery),
            quizzes: Arc::new(FixtureQuizEvaluation),
            exams: Arc::new(FixtureCertificationExam),
            certificates: Arc::new(FixtureCertificateVerification),
            profiles: Arc::new(FixtureProfileQuery),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub catalogue: Arc<dyn CatalogueQuery>,
    pub modules: Arc<dyn ModuleContentQuery>,
    pub quizzes: Arc<dyn QuizEvaluation>,
    pub exams: Arc<dyn CertificationExam>,
    pub certificates: Arc<dyn CertificateVerification>,
    pub profiles: Arc<dyn ProfileQuery>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use skillflash::domain::ports::FixtureProfileQuery;
    /// use skillflash::inbound::http::state::{HttpState, HttpStatePorts};
    ///
    /// let state = HttpState::new(HttpStatePorts {
    ///     profiles: Arc::new(FixtureProfileQuery),
    ///     ..HttpStatePorts::default()
    /// });
    /// let _login = state.login.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            catalogue,
            modules,
            quizzes,
            exams,
            certificates,
            profiles,
        } = ports;
        Self {
            login,
            catalogue,
            modules,
            quizzes,
            exams,
            certificates,
            profiles,
        }
    }
}
