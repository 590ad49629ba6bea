//! Backend entry-point: loads configuration, prepares storage, and serves
//! the REST API with health probes and OpenAPI docs.

mod server;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use storefront::inbound::http::auth_config::{BuildMode, auth_settings_from_env};
use storefront::inbound::http::health::HealthState;
use storefront::outbound::persistence::{DbPool, PoolConfig, migrate};

use server::{AppSettings, OutboundConfig, ServerConfig, create_server};

fn config_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {err}"))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|err| config_error("configuration", err))?;
    let auth = auth_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(|err| config_error("authentication settings", err))?;
    let outbound =
        OutboundConfig::from_settings(&settings).map_err(|err| config_error("outbound", err))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|err| config_error("bind address", err))?;

    let mut config = ServerConfig::new(auth, outbound, bind_addr);
    if let Some(database_url) = settings.database_url.clone() {
        let applied = migrate(database_url.clone())
            .await
            .map_err(|err| config_error("migrations", err))?;
        info!(applied, "database schema up to date");
        let pool = DbPool::new(
            PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
        )
        .await
        .map_err(|err| config_error("database pool", err))?;
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    let handle = server.handle();
    let drain_state = health_state.clone();
    actix_web::rt::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested; draining");
            drain_state.mark_draining();
            handle.stop(true).await;
        }
    });

    health_state.mark_ready();
    info!(%bind_addr, "storefront listening");
    server.await
}
