//! HTTP inbound adapter exposing the `/api/v1` REST endpoints.

pub mod auth;
pub mod certificates;
pub mod certification;
pub mod courses;
pub mod error;
pub mod health;
pub mod profiles;
pub mod quizzes;
pub mod schemas;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;
