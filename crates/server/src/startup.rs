use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use migration::MigratorTrait;
use service::auth::AuthConfig;
use service::export::CsvFormat;
use service::import::HttpCsvParser;
use service::repo::Repositories;
use service::Services;

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Wire repositories, the CSV parser client and the export format into handler state.
pub fn build_state(cfg: &AppConfig, repos: Repositories) -> Result<AppState, StartupError> {
    let parser = HttpCsvParser::from_config(&cfg.csv_parser).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let format = CsvFormat::try_from(&cfg.export).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let services = Services::new(repos, AuthConfig::from(&cfg.auth), Arc::new(parser), format);
    Ok(AppState::new(services, cfg.auth.cookie_name.clone()))
}

/// Public entry: load config, migrate, build the app and serve it.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;

    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    migration::Migrator::up(&db, None).await.map_err(|e| StartupError::Database(e.to_string()))?;
    info!("migrations applied");

    let state = build_state(&cfg, Repositories::seaorm(db))?;
    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg)?;
    info!(%addr, parser = %cfg.csv_parser.url, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
