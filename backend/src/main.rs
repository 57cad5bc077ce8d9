//! Service entry point: load settings, prepare storage, and serve the API.

use actix_web::web;
use color_eyre::eyre::{Context, Result};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use skillflash::inbound::http::health::HealthState;
use skillflash::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use skillflash::server::{AppSettings, BuildMode, ServerConfig, create_server, load_session_key};

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let settings =
        AppSettings::load_from_iter(std::env::args_os()).wrap_err("failed to load settings")?;
    let key = load_session_key(
        &settings.session_key_file(),
        BuildMode::from_debug_assertions(),
        settings.session_allow_ephemeral,
    )?;

    let bind_addr = settings.bind_addr()?;
    let mut config = ServerConfig::new(
        key,
        settings.session_cookie_secure,
        settings.same_site()?,
        bind_addr,
    )
    .with_public_base_url(settings.public_base_url()?)
    .with_ai(settings.ai_client_config()?);

    match settings.database_url.as_deref() {
        Some(database_url) => {
            let applied = run_pending_migrations(database_url)
                .await
                .wrap_err("database migrations failed")?;
            info!(applied, "database schema up to date");
            let pool = DbPool::new(
                PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
            )
            .await?;
            config = config.with_db_pool(pool);
        }
        None => warn!("no database configured; serving in-process fixtures"),
    }
    if settings.ai_api_key.is_none() {
        warn!("no AI provider key configured; module generation and grading are disabled");
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(%bind_addr, "listening");
    server.await?;
    Ok(())
}
