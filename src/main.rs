use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use course_recommendation_service::handlers::{self, AppState};
use course_recommendation_service::services::snapshot::{Snapshot, SnapshotHandle};
use course_recommendation_service::services::{load_scorer, RecommendationEngine};
use course_recommendation_service::Config;

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "info,actix_web=info,course_recommendation_service=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {e}");
            eprintln!("ERROR: Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Starting {} v{}",
        config.service.service_name,
        env!("CARGO_PKG_VERSION")
    );

    // Build the serving snapshot once from the CSV tables. Integrity
    // errors in the input data abort startup.
    let data_dir = PathBuf::from(&config.data.data_dir);
    let snapshot = Snapshot::load(&data_dir, config.fallback)
        .with_context(|| format!("failed to load data from {}", data_dir.display()))?;

    // Select the scoring strategy: trained model if its artifacts load,
    // heuristic otherwise.
    let scorer = load_scorer(&config.model);
    let engine = RecommendationEngine::new(scorer);
    tracing::info!(scorer = engine.scorer_name(), "scoring strategy selected");

    let state = web::Data::new(AppState {
        snapshot: SnapshotHandle::new(snapshot),
        engine,
        data_dir,
        fallback: config.fallback,
        service_name: config.service.service_name.clone(),
    });

    let http_port = config.service.http_port;
    tracing::info!("HTTP server listening on 0.0.0.0:{http_port}");

    HttpServer::new(move || {
        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind(("0.0.0.0", http_port))
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")
}
