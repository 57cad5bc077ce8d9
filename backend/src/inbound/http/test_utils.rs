//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test;

use crate::domain::ports::DEMO_LEARNERS;
use crate::inbound::http::auth::LoginRequest;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Id of the first demo learner, who [`login_cookie`] signs in as.
pub fn demo_learner_id() -> &'static str {
    DEMO_LEARNERS[0].2
}

/// Sign in as the first demo learner through `POST /api/v1/login` and
/// return the session cookie. The app must mount the login handler.
pub async fn login_cookie<S>(app: &S) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (username, password, _) = DEMO_LEARNERS[0];
    let response = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(LoginRequest {
                username: username.to_owned(),
                password: password.to_owned(),
            })
            .to_request(),
    )
    .await;
    assert!(response.status().is_success(), "demo login succeeds");
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}
