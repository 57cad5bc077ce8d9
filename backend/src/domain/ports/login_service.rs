//! Driving port that turns login credentials into a learner identity.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated learner id.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error>;
}

/// Demo learners accepted by [`FixtureLoginService`]: username, password,
/// and stable id.
pub const DEMO_LEARNERS: [(&str, &str, &str); 3] = [
    ("ada", "lovelace", "6d1f0c1e-4a8e-4c1a-9d7e-2b8f3a9c5e01"),
    ("grace", "hopper", "a3c2b7d4-51e6-4f08-8b3a-7c9d0e1f2a02"),
    ("admin", "password", "123e4567-e89b-12d3-a456-426614174000"),
];

/// Stand-in authenticator over [`DEMO_LEARNERS`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLoginService;

#[async_trait]
impl LoginService for FixtureLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let (_, _, id) = DEMO_LEARNERS
            .iter()
            .find(|(username, password, _)| {
                *username == credentials.username() && *password == credentials.password()
            })
            .ok_or_else(|| Error::unauthorized("invalid credentials"))?;
        UserId::new(*id).map_err(|err| Error::internal(format!("invalid demo learner id: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case("ada", "lovelace", Some("6d1f0c1e-4a8e-4c1a-9d7e-2b8f3a9c5e01"))]
    #[case("admin", "password", Some("123e4567-e89b-12d3-a456-426614174000"))]
    #[case("ada", "hopper", None)]
    #[case("nobody", "password", None)]
    #[tokio::test]
    async fn demo_learners_authenticate(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: Option<&str>,
    ) {
        let creds =
            LoginCredentials::try_from_parts(username, password).expect("credentials shape");
        let result = FixtureLoginService.authenticate(&creds).await;
        match (expected, result) {
            (Some(id), Ok(user)) => assert_eq!(user.as_ref(), id),
            (None, Err(err)) => assert_eq!(err.code(), ErrorCode::Unauthorized),
            (expected, other) => panic!("expected {expected:?}, got {other:?}"),
        }
    }
}
