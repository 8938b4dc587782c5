use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::handlers::AppState;
use crate::models::{CourseId, LearnerProfile, Recommendation, StudentId};

fn default_top_n() -> i64 {
    5
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub student_id: Option<StudentId>,
    pub course_id: Option<CourseId>,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    student_id: StudentId,
    course_id: CourseId,
    success_probability: f32,
    success_percentage: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub student_id: Option<StudentId>,
    #[serde(default = "default_top_n")]
    pub top_n: i64,
}

#[derive(Debug, Serialize)]
struct RecommendResponse {
    student_id: StudentId,
    recommendations: Vec<Recommendation>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendCustomRequest {
    pub skills: Option<Vec<String>>,
    pub completion_rate: Option<f64>,
    pub experience: Option<i64>,
    #[serde(default = "default_top_n")]
    pub top_n: i64,
}

#[derive(Debug, Serialize)]
struct RecommendCustomResponse {
    input: LearnerProfile,
    recommendations: Vec<Recommendation>,
}

/// POST /predict — completion probability for one (student, course) pair.
/// Unknown ids are served through the fallback statistics, not rejected.
#[post("/predict")]
pub async fn predict(
    state: web::Data<AppState>,
    body: web::Json<PredictRequest>,
) -> Result<HttpResponse> {
    let (Some(student_id), Some(course_id)) = (body.student_id, body.course_id) else {
        return Err(AppError::Validation(
            "Missing student_id or course_id".to_string(),
        ));
    };

    let snapshot = state.snapshot.current();
    let probability = state.engine.predict(&snapshot, student_id, course_id)?;

    Ok(HttpResponse::Ok().json(PredictResponse {
        student_id,
        course_id,
        success_probability: probability,
        success_percentage: format!("{:.1}%", probability * 100.0),
    }))
}

/// POST /recommend — ranked candidates for a student.
#[post("/recommend")]
pub async fn recommend(
    state: web::Data<AppState>,
    body: web::Json<RecommendRequest>,
) -> Result<HttpResponse> {
    let Some(student_id) = body.student_id else {
        return Err(AppError::Validation("Missing student_id".to_string()));
    };

    debug!(student_id, top_n = body.top_n, "recommendation request");

    let snapshot = state.snapshot.current();
    let recommendations = state.engine.recommend(&snapshot, student_id, body.top_n)?;

    Ok(HttpResponse::Ok().json(RecommendResponse {
        student_id,
        recommendations,
    }))
}

/// POST /recommend-custom — ranked candidates for a synthetic learner
/// profile, bypassing student lookups entirely.
#[post("/recommend-custom")]
pub async fn recommend_custom(
    state: web::Data<AppState>,
    body: web::Json<RecommendCustomRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let (Some(skills), Some(completion_rate), Some(experience)) =
        (body.skills, body.completion_rate, body.experience)
    else {
        return Err(AppError::Validation(
            "Missing skills, completion_rate, or experience".to_string(),
        ));
    };

    if !(0.0..=1.0).contains(&completion_rate) {
        return Err(AppError::Validation(
            "completion_rate must be between 0 and 1".to_string(),
        ));
    }
    if experience < 0 {
        return Err(AppError::Validation(
            "experience must be a non-negative integer".to_string(),
        ));
    }

    let profile = LearnerProfile {
        skills: skills.into_iter().collect(),
        completion_rate: completion_rate as f32,
        experience: experience as u32,
    };

    let snapshot = state.snapshot.current();
    let recommendations = state
        .engine
        .recommend_for_profile(&snapshot, &profile, body.top_n)?;

    Ok(HttpResponse::Ok().json(RecommendCustomResponse {
        input: profile,
        recommendations,
    }))
}
