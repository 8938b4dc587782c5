/// Recommendation Engine
///
/// Excludes already-enrolled courses, scores the remaining candidates with
/// one batched scorer call, and returns a deterministically ranked top-N.
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::models::{CourseId, LearnerProfile, Recommendation, StudentId};
use crate::services::scoring::Scorer;
use crate::services::snapshot::Snapshot;

pub struct RecommendationEngine {
    scorer: Arc<dyn Scorer>,
}

impl RecommendationEngine {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    /// Completion probability for a single (student, course) pair.
    pub fn predict(
        &self,
        snapshot: &Snapshot,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<f32> {
        let matrix = snapshot.features().build_matrix(student_id, &[course_id]);
        let scores = self.scorer.score_batch(&matrix)?;
        scores
            .first()
            .copied()
            .ok_or_else(|| crate::error::AppError::Scoring("scorer returned no rows".to_string()))
    }

    /// Top-N candidates for a known (or unknown, via fallbacks) student.
    pub fn recommend(
        &self,
        snapshot: &Snapshot,
        student_id: StudentId,
        top_n: i64,
    ) -> Result<Vec<Recommendation>> {
        if top_n <= 0 {
            return Ok(vec![]);
        }

        let enrolled = snapshot.store().enrolled_courses(student_id);
        let candidates: Vec<CourseId> = snapshot
            .store()
            .course_ids()
            .iter()
            .copied()
            .filter(|course_id| !enrolled.contains(course_id))
            .collect();

        debug!(
            student_id,
            candidates = candidates.len(),
            scorer = self.scorer.name(),
            "scoring recommendation candidates"
        );

        let matrix = snapshot.features().build_matrix(student_id, &candidates);
        let scores = self.scorer.score_batch(&matrix)?;
        Ok(rank(candidates, scores, top_n as usize))
    }

    /// Top-N for a synthetic learner profile; every known course is a
    /// candidate since the profile has no enrollment history.
    pub fn recommend_for_profile(
        &self,
        snapshot: &Snapshot,
        profile: &LearnerProfile,
        top_n: i64,
    ) -> Result<Vec<Recommendation>> {
        if top_n <= 0 {
            return Ok(vec![]);
        }

        let candidates: Vec<CourseId> = snapshot.store().course_ids().to_vec();
        let matrix = snapshot.features().build_profile_matrix(profile, &candidates);
        let scores = self.scorer.score_batch(&matrix)?;
        Ok(rank(candidates, scores, top_n as usize))
    }

    /// Batch generation across every known student, one scorer call per
    /// student. Rows are independent once the snapshot is built.
    pub fn recommend_for_all(
        &self,
        snapshot: &Snapshot,
        top_n: i64,
    ) -> Result<Vec<(StudentId, Vec<Recommendation>)>> {
        snapshot
            .store()
            .student_ids()
            .iter()
            .map(|&student_id| Ok((student_id, self.recommend(snapshot, student_id, top_n)?)))
            .collect()
    }
}

/// Probability descending; ascending course_id breaks ties so rankings are
/// reproducible regardless of input order.
fn rank(candidates: Vec<CourseId>, scores: Vec<f32>, top_n: usize) -> Vec<Recommendation> {
    let mut ranked: Vec<Recommendation> = candidates
        .into_iter()
        .zip(scores)
        .map(|(course_id, success_probability)| Recommendation {
            course_id,
            success_probability,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.success_probability
            .partial_cmp(&a.success_probability)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.course_id.cmp(&b.course_id))
    });
    ranked.truncate(top_n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FallbackConfig;
    use crate::error::AppError;
    use crate::models::Enrollment;
    use crate::services::scoring::HeuristicScorer;
    use crate::services::store::EntityStore;
    use ndarray::Array2;

    fn enrollment(student_id: u32, course_id: u32, completed: bool) -> Enrollment {
        Enrollment {
            student_id,
            course_id,
            progress_percentage: 60.0,
            completed,
            completed_at: None,
        }
    }

    fn snapshot() -> Snapshot {
        let mut enrollments = vec![
            enrollment(7, 1, true),
            enrollment(7, 2, false),
            enrollment(8, 3, true),
        ];
        // Give the other courses some history so probabilities vary
        for course_id in 3..=10 {
            enrollments.push(enrollment(100 + course_id, course_id, course_id % 2 == 0));
        }
        let store = EntityStore::from_tables(
            enrollments,
            vec![(7, "Python".to_string()), (7, "SQL".to_string())],
            vec![
                (3, "Python".to_string()),
                (3, "SQL".to_string()),
                (4, "React".to_string()),
            ],
        );
        Snapshot::from_store(store, FallbackConfig::default())
    }

    fn engine() -> RecommendationEngine {
        RecommendationEngine::new(Arc::new(HeuristicScorer::new()))
    }

    #[test]
    fn excludes_enrolled_courses() {
        let snapshot = snapshot();
        let recs = engine().recommend(&snapshot, 7, 100).unwrap();
        let course_ids: Vec<u32> = recs.iter().map(|r| r.course_id).collect();
        assert!(!course_ids.contains(&1));
        assert!(!course_ids.contains(&2));
        // 10 known courses, 2 enrolled
        assert_eq!(recs.len(), 8);
    }

    #[test]
    fn respects_top_n_and_ordering() {
        let snapshot = snapshot();
        let recs = engine().recommend(&snapshot, 7, 3).unwrap();
        assert_eq!(recs.len(), 3);
        for pair in recs.windows(2) {
            assert!(pair[0].success_probability >= pair[1].success_probability);
        }
    }

    #[test]
    fn top_n_zero_or_negative_yields_empty() {
        let snapshot = snapshot();
        assert!(engine().recommend(&snapshot, 7, 0).unwrap().is_empty());
        assert!(engine().recommend(&snapshot, 7, -4).unwrap().is_empty());
    }

    #[test]
    fn top_n_larger_than_candidates_returns_all() {
        let snapshot = snapshot();
        let recs = engine().recommend(&snapshot, 7, 1000).unwrap();
        assert_eq!(recs.len(), 8);
    }

    #[test]
    fn unknown_student_gets_full_ranked_list() {
        let snapshot = snapshot();
        let recs = engine().recommend(&snapshot, 424242, 5).unwrap();
        assert_eq!(recs.len(), 5);
        for r in &recs {
            assert!((0.0..=1.0).contains(&r.success_probability));
        }
    }

    #[test]
    fn predict_matches_recommend_score() {
        let snapshot = snapshot();
        let engine = engine();
        let recs = engine.recommend(&snapshot, 7, 100).unwrap();
        let picked = &recs[0];
        let direct = engine.predict(&snapshot, 7, picked.course_id).unwrap();
        assert_eq!(direct, picked.success_probability);
    }

    #[test]
    fn profile_recommendations_cover_all_courses() {
        let snapshot = snapshot();
        let profile = LearnerProfile {
            skills: ["Python".to_string(), "SQL".to_string()].into_iter().collect(),
            completion_rate: 0.8,
            experience: 3,
        };
        let recs = engine()
            .recommend_for_profile(&snapshot, &profile, 1000)
            .unwrap();
        assert_eq!(recs.len(), snapshot.store().course_ids().len());
    }

    #[test]
    fn batch_generation_matches_per_student_calls() {
        let snapshot = snapshot();
        let engine = engine();
        let all = engine.recommend_for_all(&snapshot, 3).unwrap();
        assert_eq!(all.len(), snapshot.store().student_ids().len());
        for (student_id, recs) in &all {
            assert_eq!(recs, &engine.recommend(&snapshot, *student_id, 3).unwrap());
        }
    }

    #[test]
    fn ties_break_by_ascending_course_id() {
        let ranked = rank(vec![9, 4, 7], vec![0.5, 0.5, 0.9], 10);
        assert_eq!(ranked[0].course_id, 7);
        assert_eq!(ranked[1].course_id, 4);
        assert_eq!(ranked[2].course_id, 9);
    }

    struct FailingScorer;
    impl Scorer for FailingScorer {
        fn score_batch(&self, _features: &Array2<f32>) -> crate::error::Result<Vec<f32>> {
            Err(AppError::Scoring("backend unavailable".to_string()))
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn scorer_failures_propagate() {
        let snapshot = snapshot();
        let engine = RecommendationEngine::new(Arc::new(FailingScorer));
        assert!(engine.recommend(&snapshot, 7, 5).is_err());
    }
}
