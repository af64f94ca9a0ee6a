#![warn(clippy::all, clippy::pedantic)]

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use clap::Parser;
use tracing::info;
use tracing_actix_web::TracingLogger;
use urlwatch_service::Config;
use urlwatch_service::database::LibsqlStore;
use urlwatch_service::monitoring::HttpProber;

mod error;
mod routes;
mod state;

use error::AppError;
use logger::init_tracing;
use state::AppState;

#[derive(Debug, Parser)]
#[command(version, about = "On-demand URL health checks with uptime history")]
struct Cli {
    /// Path to the TOML config file, created with defaults if missing
    #[arg(short, long, env = "URLWATCH_CONFIG")]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_config(cli.config.as_deref())?.apply_env_overrides()?;
    info!("{config}");

    let store = Arc::new(LibsqlStore::open(&config.database).await.map_err(AppError::Startup)?);
    let prober = Arc::new(HttpProber::from_config(&config.probe).map_err(AppError::Startup)?);
    let state = web::Data::new(AppState::new(store.clone(), prober, config.probe.max_concurrency));

    let result = run_server(&config.server.bind, config.server.port, state).await;

    store.close();
    info!("record store closed");
    result
}

async fn run_server(bind: &str, port: u16, state: web::Data<AppState>) -> Result<(), AppError> {
    info!(bind, port, "starting HTTP server");

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(TracingLogger::default())
            .app_data(state.clone())
            .app_data(routes::json_config())
            .app_data(routes::query_config())
            .configure(routes::routes)
    })
    .bind((bind, port))?
    .run()
    .await?;

    Ok(())
}
