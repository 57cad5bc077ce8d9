//! Server construction and middleware wiring.

mod config;
mod session_key;
mod state_builders;

pub use config::{AppSettings, ServerConfig, SettingsError};
pub use session_key::{
    BuildMode, SESSION_KEY_MIN_LEN, SessionKeyError, key_fingerprint, load_session_key,
};
pub use state_builders::{LearningPorts, LearningServices, build_learning_services};

use state_builders::build_learning_ports;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::spawn_exam_sweeper;
use crate::inbound::http::auth::{login, logout};
use crate::inbound::http::certificates::verify_certificate;
use crate::inbound::http::certification::{
    answer_question, next_question, previous_question, retry_exam, start_exam, submit_exam,
    view_exam,
};
use crate::inbound::http::courses::{course_progress, get_module, list_courses};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::profiles::{current_profile, leaderboard};
use crate::inbound::http::quizzes::submit_attempt;
use crate::inbound::http::state::HttpState;

const SESSION_COOKIE_NAME: &str = "session";
const SESSION_TTL_HOURS: i64 = 2;

/// Everything one app instance needs; cloned into each worker.
#[derive(Clone)]
pub struct AppDependencies {
    pub health_state: web::Data<HealthState>,
    pub http_state: web::Data<HttpState>,
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

/// Mount the API scope behind the cookie session, plus probes and docs.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE_NAME.into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(PersistentSession::default().session_ttl(
            actix_web::cookie::time::Duration::hours(SESSION_TTL_HOURS),
        ))
        .build();

    let api = web::scope("/api/v1")
        .wrap(session)
        .service(login)
        .service(logout)
        .service(list_courses)
        .service(course_progress)
        .service(get_module)
        .service(submit_attempt)
        .service(view_exam)
        .service(start_exam)
        .service(answer_question)
        .service(next_question)
        .service(previous_question)
        .service(submit_exam)
        .service(retry_exam)
        .service(verify_certificate)
        .service(current_profile)
        .service(leaderboard);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct the HTTP server, start the exam sweeper, and mark the service
/// ready.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when the AI client cannot be built or the
/// socket cannot be bound.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        public_base_url,
        db_pool,
        ai,
    } = config;

    let ports = build_learning_ports(db_pool.as_ref(), ai)
        .map_err(|err| std::io::Error::other(format!("AI client setup failed: {err}")))?;
    let LearningServices { http_state, exams } = build_learning_services(ports, &public_base_url);
    let http_state = web::Data::new(http_state);
    spawn_exam_sweeper(exams);

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::TRACE_ID_HEADER;

    fn deps() -> AppDependencies {
        let services = build_learning_services(LearningPorts::fixtures(), "http://localhost");
        AppDependencies {
            health_state: web::Data::new(HealthState::new()),
            http_state: web::Data::new(services.http_state),
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        }
    }

    #[actix_web::test]
    async fn api_responses_carry_trace_ids() {
        let app = test::init_service(build_app(deps())).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/courses").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(TRACE_ID_HEADER));
    }

    #[actix_web::test]
    async fn login_sets_a_session_cookie_for_the_profile_route() {
        let app = test::init_service(build_app(deps())).await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(json!({"username": "ada", "password": "lovelace"}))
                .to_request(),
        )
        .await;
        assert!(res.status().is_success());
        let cookie = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
            .expect("session cookie")
            .into_owned();

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
        assert_eq!(body["points"], 0);
    }

    #[actix_web::test]
    async fn probes_answer_outside_the_api_scope() {
        let deps = deps();
        deps.health_state.mark_ready();
        let app = test::init_service(build_app(deps)).await;
        for uri in ["/health/ready", "/health/live"] {
            let res =
                test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(res.status(), StatusCode::OK, "{uri}");
        }
    }
}
