/// HTTP Handlers
///
/// JSON request/response surface over the shared snapshot and the
/// recommendation engine.
pub mod admin;
pub mod health;
pub mod recommendations;

use actix_web::web;
use std::path::PathBuf;

use crate::config::FallbackConfig;
use crate::error::AppError;
use crate::services::{RecommendationEngine, SnapshotHandle};

pub use admin::reload;
pub use health::{index, stats};
pub use recommendations::{predict, recommend, recommend_custom};

/// Shared application state: the swappable snapshot, the scoring engine,
/// and what a reload needs to rebuild from disk.
pub struct AppState {
    pub snapshot: SnapshotHandle,
    pub engine: RecommendationEngine,
    pub data_dir: PathBuf,
    pub fallback: FallbackConfig,
    pub service_name: String,
}

/// Register every route plus a JSON extractor config that turns payload
/// errors into the service's 400 envelope instead of actix's default body.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .service(index)
    .service(health::health)
    .service(stats)
    .service(predict)
    .service(recommend)
    .service(recommend_custom)
    .service(reload);
}
