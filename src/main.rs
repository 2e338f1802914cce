use actix_web::HttpServer;
use actix_web::web::Data;
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod app;
mod config;
mod db;
mod docs;
mod middleware;
mod model;
mod routes;
mod service;
mod utils;

use config::{Config, LogConfig};
use db::init_db;
use db::store::AttendanceStore;
use service::attendance::AttendanceService;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use utils::static_files::StaticRoot;

fn init_tracing(log_config: &LogConfig) -> WorkerGuard {
    // Rolling daily log
    let file_appender = rolling::daily(&log_config.log_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(log_config.log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false) // removes module path
                .with_thread_ids(false)
                .with_thread_names(false)
                .pretty(),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false),
        )
        .init();

    guard
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let guard = init_tracing(&LogConfig::from_env());
    info!("Server starting...");

    let config = Config::from_env()?;

    let store = match init_db(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Exceeded max DB connection attempts, exiting");
            // flush the file writer before the hard exit
            drop(guard);
            std::process::exit(1);
        }
    };
    info!("MySQL connected and tables created");

    let store: Arc<dyn AttendanceStore> = Arc::new(store);
    let service = Data::new(AttendanceService::new(store, config.enrichment));
    let static_root = Data::new(StaticRoot::new(config.static_dir.clone()));
    info!(enrichment = config.enrichment, static_dir = %config.static_dir.display(), "Attendance service configured");

    let server = HttpServer::new(move || app::build(service.clone(), static_root.clone()))
        .bind((config.host.as_str(), config.port))?;

    info!("Server running on port {}", config.port);
    server.run().await?;

    drop(guard);
    Ok(())
}
