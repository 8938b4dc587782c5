/// Aggregate Statistics Engine
///
/// Derived per-entity statistics computed in a single pass over the
/// deduplicated enrollment history. Entities with no history resolve to
/// the configured fallback values instead of erroring.
use std::collections::HashMap;

use crate::config::FallbackConfig;
use crate::models::{CourseId, Enrollment, StudentId};

#[derive(Debug, Clone, Copy)]
pub struct StudentStats {
    pub completion_rate: f32,
    pub experience: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct CourseStats {
    pub completion_rate: f32,
    pub difficulty: f32,
    pub popularity: u32,
    pub avg_progress: f32,
}

#[derive(Default)]
struct Accumulator {
    total: u32,
    completed: u32,
    progress_sum: f64,
}

pub struct AggregateStats {
    students: HashMap<StudentId, StudentStats>,
    courses: HashMap<CourseId, CourseStats>,
    fallback: FallbackConfig,
}

impl AggregateStats {
    pub fn from_enrollments(enrollments: &[Enrollment], fallback: FallbackConfig) -> Self {
        let mut per_student: HashMap<StudentId, Accumulator> = HashMap::new();
        let mut per_course: HashMap<CourseId, Accumulator> = HashMap::new();

        for e in enrollments {
            let s = per_student.entry(e.student_id).or_default();
            s.total += 1;
            s.completed += u32::from(e.completed);

            let c = per_course.entry(e.course_id).or_default();
            c.total += 1;
            c.completed += u32::from(e.completed);
            c.progress_sum += f64::from(e.progress_percentage);
        }

        let students = per_student
            .into_iter()
            .map(|(id, acc)| {
                (
                    id,
                    StudentStats {
                        completion_rate: acc.completed as f32 / acc.total as f32,
                        experience: acc.total,
                    },
                )
            })
            .collect();

        let courses = per_course
            .into_iter()
            .map(|(id, acc)| {
                let completion_rate = acc.completed as f32 / acc.total as f32;
                (
                    id,
                    CourseStats {
                        completion_rate,
                        difficulty: 1.0 - completion_rate,
                        popularity: acc.total,
                        avg_progress: (acc.progress_sum / f64::from(acc.total)) as f32,
                    },
                )
            })
            .collect();

        Self {
            students,
            courses,
            fallback,
        }
    }

    pub fn fallback(&self) -> &FallbackConfig {
        &self.fallback
    }

    pub fn student_completion_rate(&self, student_id: StudentId) -> f32 {
        self.students
            .get(&student_id)
            .map(|s| s.completion_rate)
            .unwrap_or(self.fallback.completion_rate)
    }

    pub fn student_experience(&self, student_id: StudentId) -> u32 {
        self.students
            .get(&student_id)
            .map(|s| s.experience)
            .unwrap_or(0)
    }

    pub fn course_completion_rate(&self, course_id: CourseId) -> f32 {
        self.courses
            .get(&course_id)
            .map(|c| c.completion_rate)
            .unwrap_or(self.fallback.completion_rate)
    }

    pub fn course_difficulty(&self, course_id: CourseId) -> f32 {
        self.courses
            .get(&course_id)
            .map(|c| c.difficulty)
            .unwrap_or_else(|| self.fallback.difficulty())
    }

    pub fn course_popularity(&self, course_id: CourseId) -> u32 {
        self.courses
            .get(&course_id)
            .map(|c| c.popularity)
            .unwrap_or(0)
    }

    pub fn course_avg_progress(&self, course_id: CourseId) -> f32 {
        self.courses
            .get(&course_id)
            .map(|c| c.avg_progress)
            .unwrap_or(self.fallback.avg_progress)
    }
}
