//! Driving port returning module content, generating it on first access.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Error, LearnerQuiz, Module, ModuleNumber, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    pub course_slug: String,
    pub module_number: ModuleNumber,
    /// `None` for anonymous previews, which bypass unlock checks.
    pub user_id: Option<UserId>,
}

/// A module with its quiz stripped of answer keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleView {
    pub course_slug: String,
    pub course_title: String,
    pub module: Module,
    pub quiz: LearnerQuiz,
    pub completed: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModuleContentQuery: Send + Sync {
    async fn get_module(&self, request: ModuleRequest) -> Result<ModuleView, Error>;
}

/// Fixture implementation where no course exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureModuleContentQuery;

#[async_trait]
impl ModuleContentQuery for FixtureModuleContentQuery {
    async fn get_module(&self, request: ModuleRequest) -> Result<ModuleView, Error> {
        Err(Error::not_found(format!(
            "course {} not found",
            request.course_slug
        )))
    }
}
