/// Feature Vector Builder
///
/// Combines entity store lookups and aggregate statistics into the fixed
/// 10-dimensional vector the classifier was trained on. Pure functions of
/// the snapshot: same inputs, same vector.
use ndarray::Array2;

use crate::models::{CourseId, LearnerProfile, StudentId};
use crate::services::stats::AggregateStats;
use crate::services::store::EntityStore;

/// Width of the model input.
pub const FEATURE_VECTOR_SIZE: usize = 10;

/// Feature indices within `FeatureVector::to_vector` output.
///
/// `course_avg_progress` occupies both index 0 and index 9; the training
/// pipeline fed the signal twice and the model's input shape expects it.
pub mod idx {
    pub const COURSE_AVG_PROGRESS: usize = 0;
    pub const SKILL_MATCH_RATIO: usize = 1;
    pub const STUDENT_SKILL_COUNT: usize = 2;
    pub const COURSE_SKILL_COUNT: usize = 3;
    pub const MATCHING_SKILLS: usize = 4;
    pub const STUDENT_COMPLETION_RATE: usize = 5;
    pub const COURSE_DIFFICULTY: usize = 6;
    pub const STUDENT_EXPERIENCE: usize = 7;
    pub const COURSE_POPULARITY: usize = 8;
    pub const COURSE_AVG_PROGRESS_REPEAT: usize = 9;
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub course_avg_progress: f32,
    pub skill_match_ratio: f32,
    pub student_skill_count: f32,
    pub course_skill_count: f32,
    pub matching_skills: f32,
    pub student_completion_rate: f32,
    pub course_difficulty: f32,
    pub student_experience: f32,
    pub course_popularity: f32,
}

impl FeatureVector {
    /// Model input layout, in trained order.
    pub fn to_vector(&self) -> [f32; FEATURE_VECTOR_SIZE] {
        [
            self.course_avg_progress,
            self.skill_match_ratio,
            self.student_skill_count,
            self.course_skill_count,
            self.matching_skills,
            self.student_completion_rate,
            self.course_difficulty,
            self.student_experience,
            self.course_popularity,
            self.course_avg_progress,
        ]
    }
}

pub struct FeatureBuilder<'a> {
    store: &'a EntityStore,
    stats: &'a AggregateStats,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(store: &'a EntityStore, stats: &'a AggregateStats) -> Self {
        Self { store, stats }
    }

    /// Build the feature vector for a (student, course) pair. Unknown ids
    /// degrade to the configured fallbacks; this never fails.
    pub fn build(&self, student_id: StudentId, course_id: CourseId) -> FeatureVector {
        let student_skills = self.store.skills_of_student(student_id);
        let course_skills = self.store.skills_of_course(course_id);
        let matching = student_skills.intersection(course_skills).count();

        self.assemble(
            course_id,
            matching,
            student_skills.len(),
            course_skills.len(),
            self.stats.student_completion_rate(student_id),
            self.stats.student_experience(student_id),
        )
    }

    /// Build for a synthetic learner: the student-side signals come from
    /// the supplied profile, the course-side signals from the snapshot.
    pub fn build_for_profile(&self, profile: &LearnerProfile, course_id: CourseId) -> FeatureVector {
        let course_skills = self.store.skills_of_course(course_id);
        let matching = profile
            .skills
            .iter()
            .filter(|s| course_skills.contains(*s))
            .count();

        self.assemble(
            course_id,
            matching,
            profile.skills.len(),
            course_skills.len(),
            profile.completion_rate,
            profile.experience,
        )
    }

    /// Row-per-candidate matrix for batch scoring.
    pub fn build_matrix(&self, student_id: StudentId, courses: &[CourseId]) -> Array2<f32> {
        self.matrix_from(courses, |course_id| self.build(student_id, course_id))
    }

    pub fn build_profile_matrix(
        &self,
        profile: &LearnerProfile,
        courses: &[CourseId],
    ) -> Array2<f32> {
        self.matrix_from(courses, |course_id| self.build_for_profile(profile, course_id))
    }

    fn assemble(
        &self,
        course_id: CourseId,
        matching: usize,
        student_skill_count: usize,
        course_skill_count: usize,
        student_completion_rate: f32,
        student_experience: u32,
    ) -> FeatureVector {
        // No division by zero: a course with no registered skills has a
        // match ratio of exactly 0.
        let skill_match_ratio = if course_skill_count > 0 {
            matching as f32 / course_skill_count as f32
        } else {
            0.0
        };

        FeatureVector {
            course_avg_progress: self.stats.course_avg_progress(course_id),
            skill_match_ratio,
            student_skill_count: student_skill_count as f32,
            course_skill_count: course_skill_count as f32,
            matching_skills: matching as f32,
            student_completion_rate,
            course_difficulty: self.stats.course_difficulty(course_id),
            student_experience: student_experience as f32,
            course_popularity: self.stats.course_popularity(course_id) as f32,
        }
    }

    fn matrix_from<F>(&self, courses: &[CourseId], mut build: F) -> Array2<f32>
    where
        F: FnMut(CourseId) -> FeatureVector,
    {
        let mut matrix = Array2::zeros((courses.len(), FEATURE_VECTOR_SIZE));
        for (i, &course_id) in courses.iter().enumerate() {
            let row = build(course_id).to_vector();
            for (j, value) in row.iter().enumerate() {
                matrix[[i, j]] = *value;
            }
        }
        matrix
    }
}
