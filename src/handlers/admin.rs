use actix_web::{post, web, HttpResponse};
use serde::Serialize;
use tracing::info;

use crate::error::{AppError, Result};
use crate::handlers::AppState;
use crate::services::snapshot::{Snapshot, SnapshotSummary};

#[derive(Serialize)]
struct ReloadResponse {
    status: &'static str,
    stats: SnapshotSummary,
}

/// POST /admin/reload — rebuild the snapshot from the data directory and
/// swap it in atomically. A failed rebuild leaves the current snapshot
/// serving.
#[post("/admin/reload")]
pub async fn reload(state: web::Data<AppState>) -> Result<HttpResponse> {
    let data_dir = state.data_dir.clone();
    let fallback = state.fallback;

    let snapshot = web::block(move || Snapshot::load(&data_dir, fallback))
        .await
        .map_err(|e| AppError::Internal(format!("reload task failed: {e}")))??;

    let summary = snapshot.summary();
    state.snapshot.replace(snapshot);
    info!(
        enrollments = summary.total_enrollments,
        "snapshot reloaded and swapped"
    );

    Ok(HttpResponse::Ok().json(ReloadResponse {
        status: "reloaded",
        stats: summary,
    }))
}
