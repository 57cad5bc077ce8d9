//! Learner profile and leaderboard handlers.
//!
//! ```text
//! GET /api/v1/me/profile
//! GET /api/v1/leaderboard?limit=10
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use serde_json::json;

use crate::domain::ports::{DEFAULT_LEADERBOARD_SIZE, MAX_LEADERBOARD_SIZE};
use crate::domain::{Error, LeaderboardEntry, Profile};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{LeaderboardEntrySchema, ProfileSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Query string for `GET /api/v1/leaderboard`.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Number of learners to return, 1 to 100. Defaults to 20.
    pub limit: Option<usize>,
}

impl LeaderboardQuery {
    fn resolve_limit(&self) -> Result<usize, Error> {
        match self.limit {
            None => Ok(DEFAULT_LEADERBOARD_SIZE),
            Some(limit) if (1..=MAX_LEADERBOARD_SIZE).contains(&limit) => Ok(limit),
            Some(limit) => Err(Error::invalid_request(format!(
                "limit must be between 1 and {MAX_LEADERBOARD_SIZE}"
            ))
            .with_details(json!({ "field": "limit", "value": limit }))),
        }
    }
}

/// Points and badges of the signed-in learner.
#[utoipa::path(
    get,
    path = "/api/v1/me/profile",
    responses(
        (status = 200, description = "Learner profile", body = ProfileSchema),
        (status = 401, description = "Login required", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["profiles"],
    operation_id = "currentProfile"
)]
#[get("/me/profile")]
pub async fn current_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Profile>> {
    let user_id = session.require_user_id()?;
    Ok(web::Json(state.profiles.profile(&user_id).await?))
}

/// Learners ranked by points.
#[utoipa::path(
    get,
    path = "/api/v1/leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Ranked learners", body = [LeaderboardEntrySchema]),
        (status = 400, description = "Limit out of range", body = Error)
    ),
    tags = ["profiles"],
    operation_id = "leaderboard",
    security([])
)]
#[get("/leaderboard")]
pub async fn leaderboard(
    state: web::Data<HttpState>,
    query: web::Query<LeaderboardQuery>,
) -> ApiResult<web::Json<Vec<LeaderboardEntry>>> {
    let limit = query.resolve_limit()?;
    Ok(web::Json(state.profiles.leaderboard(limit).await?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::App;
    use actix_web::test::{self};
    use rstest::rstest;
    use serde_json::Value;

    use super::*;
    use crate::domain::ports::MockProfileQuery;
    use crate::domain::{Badge, UserId};
    use crate::inbound::http::auth::login;
    use crate::inbound::http::state::HttpStatePorts;
    use crate::inbound::http::test_utils::{login_cookie, test_session_middleware};

    fn app_with(
        profiles: MockProfileQuery,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let state = HttpState::new(HttpStatePorts {
            profiles: Arc::new(profiles),
            ..HttpStatePorts::default()
        });
        App::new()
            .app_data(web::Data::new(state))
            .wrap(test_session_middleware())
            .service(
                web::scope("/api/v1")
                    .service(login)
                    .service(current_profile)
                    .service(leaderboard),
            )
    }

    #[rstest]
    #[case::default(None, Ok(20))]
    #[case::smallest(Some(1), Ok(1))]
    #[case::largest(Some(100), Ok(100))]
    #[case::zero(Some(0), Err(()))]
    #[case::too_many(Some(101), Err(()))]
    fn limits_are_bounded(#[case] limit: Option<usize>, #[case] expected: Result<usize, ()>) {
        let resolved = LeaderboardQuery { limit }.resolve_limit().map_err(|_| ());
        assert_eq!(resolved, expected);
    }

    #[actix_web::test]
    async fn profile_requires_login() {
        let mut profiles = MockProfileQuery::new();
        profiles.expect_profile().never();
        let app = test::init_service(app_with(profiles)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/me/profile").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn profile_reports_points_and_badges() {
        let mut profiles = MockProfileQuery::new();
        profiles.expect_profile().times(1).returning(|user_id| {
            Ok(Profile {
                points: 150,
                badges: vec![Badge::FirstSteps, Badge::Certified],
                ..Profile::new(user_id.clone())
            })
        });
        let app = test::init_service(app_with(profiles)).await;
        let cookie = login_cookie(&app).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/me/profile")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["points"], 150);
        assert_eq!(body["badges"][1], "Certified");
    }

    #[actix_web::test]
    async fn leaderboard_uses_the_requested_limit() {
        let mut profiles = MockProfileQuery::new();
        profiles
            .expect_leaderboard()
            .withf(|limit| *limit == 5)
            .times(1)
            .returning(|_| {
                Ok(vec![LeaderboardEntry {
                    rank: 1,
                    user_id: UserId::random(),
                    name: "Learner".to_owned(),
                    points: 300,
                    badge_count: 2,
                }])
            });
        let app = test::init_service(app_with(profiles)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/leaderboard?limit=5")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body[0]["rank"], 1);
        assert_eq!(body[0]["badgeCount"], 2);
    }

    #[actix_web::test]
    async fn out_of_range_limits_are_rejected() {
        let mut profiles = MockProfileQuery::new();
        profiles.expect_leaderboard().never();
        let app = test::init_service(app_with(profiles)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/leaderboard?limit=500")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
