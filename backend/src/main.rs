//! Service entry-point: loads settings, prepares storage and serves the API.

mod server;

use std::io;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use schoollib::config::AppSettings;
use schoollib::inbound::http::health::HealthState;
use schoollib::inbound::http::session_config::{BuildMode, session_settings_from_env};
use schoollib::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

#[cfg(feature = "metrics")]
use server::make_metrics;
use server::{ServerConfig, Storage, create_server, seed_accounts};

fn init_tracing() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

async fn prepare_storage(settings: &AppSettings) -> io::Result<Storage> {
    let Some(database_url) = settings.database_url() else {
        warn!("no database configured; accounts, loans and titles are kept in memory");
        return Ok(Storage::memory());
    };

    if settings.run_migrations {
        run_pending_migrations(database_url)
            .await
            .map_err(io::Error::other)?;
    }
    let pool = DbPool::new(
        PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
    )
    .await
    .map_err(io::Error::other)?;
    Ok(Storage::Postgres(pool))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    init_tracing();

    let settings = AppSettings::load().map_err(io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;
    let loan_period = settings.loan_period().map_err(io::Error::other)?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(io::Error::other)?;

    let storage = prepare_storage(&settings).await?;
    let seeded = seed_accounts(&storage).await.map_err(io::Error::other)?;
    info!(seeded, "built-in accounts ready");
    let health_state = web::Data::new(HealthState::new(storage.backend()));

    let config =
        ServerConfig::new(session, bind_addr, storage).with_loan_period(loan_period);
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(make_metrics()?));

    let server = create_server(health_state, config)?;
    info!(%bind_addr, loan_days = loan_period.days(), "library service listening");
    server.await
}
