//! Timetable server entry point.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, create_server};
use timetable::inbound::http::health::HealthState;
use timetable::inbound::http::session_config::{BuildMode, session_settings_from_env};
use timetable::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use timetable::settings::AppSettings;

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

    let settings = AppSettings::load().wrap_err("loading TIMETABLE settings")?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::current())
        .wrap_err("validating session settings")?;
    info!(fingerprint = %session.key_fingerprint(), "session key loaded");

    let bind_addr = settings.bind_addr()?;
    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
    )
    .with_default_shape(settings.default_shape()?)
    .with_max_write_attempts(settings.max_write_attempts());

    if let Some(url) = settings.database_url() {
        run_pending_migrations(url)
            .await
            .wrap_err("applying database migrations")?;
        let pool = DbPool::new(PoolConfig::new(url).with_max_size(settings.db_max_connections()))
            .await
            .wrap_err("connecting to PostgreSQL")?;
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!(%bind_addr, "timetable server listening");
    let outcome = server.await;
    health_state.mark_draining();
    outcome.wrap_err("server terminated")
}
