use actix_web::{get, web, HttpResponse};
use serde::Serialize;

use crate::error::Result;
use crate::handlers::AppState;

#[derive(Serialize)]
struct IndexResponse {
    service: String,
    version: &'static str,
    scorer: &'static str,
    endpoints: [&'static str; 7],
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct StatsResponse {
    total_students: usize,
    total_courses: usize,
    total_enrollments: usize,
    completion_rate: String,
    unique_skills: usize,
}

/// GET /
#[get("/")]
pub async fn index(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(IndexResponse {
        service: state.service_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        scorer: state.engine.scorer_name(),
        endpoints: [
            "GET /",
            "GET /health",
            "GET /stats",
            "POST /predict (student_id, course_id)",
            "POST /recommend (student_id, top_n)",
            "POST /recommend-custom (skills, completion_rate, experience, top_n)",
            "POST /admin/reload",
        ],
    }))
}

/// GET /health
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { status: "OK" })
}

/// GET /stats — counts over the current snapshot.
#[get("/stats")]
pub async fn stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let summary = state.snapshot.current().summary();
    Ok(HttpResponse::Ok().json(StatsResponse {
        total_students: summary.total_students,
        total_courses: summary.total_courses,
        total_enrollments: summary.total_enrollments,
        completion_rate: format!("{:.1}%", summary.completion_rate * 100.0),
        unique_skills: summary.unique_skills,
    }))
}
