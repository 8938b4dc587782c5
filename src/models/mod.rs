use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type StudentId = u32;
pub type CourseId = u32;

/// One deduplicated enrollment record.
#[derive(Debug, Clone)]
pub struct Enrollment {
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub progress_percentage: f32,
    /// Derived from a non-empty completed_at cell, even when the timestamp
    /// itself fails to parse.
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Synthetic learner used by /recommend-custom: the caller supplies the
/// student-side signals instead of the entity store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub skills: HashSet<String>,
    pub completion_rate: f32,
    pub experience: u32,
}

/// One ranked recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub course_id: CourseId,
    pub success_probability: f32,
}
