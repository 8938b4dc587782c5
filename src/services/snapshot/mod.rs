/// Immutable serving snapshot.
///
/// The entity store and aggregate statistics are built together from one
/// read of the CSV tables and shared read-only across requests. Picking up
/// new data means building a fresh snapshot and swapping the handle; the
/// live snapshot is never mutated.
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::info;

use crate::config::FallbackConfig;
use crate::error::Result;
use crate::services::features::FeatureBuilder;
use crate::services::stats::AggregateStats;
use crate::services::store::EntityStore;

pub struct Snapshot {
    store: EntityStore,
    stats: AggregateStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub total_students: usize,
    pub total_courses: usize,
    pub total_enrollments: usize,
    /// Fraction of enrollments marked completed, in [0, 1].
    pub completion_rate: f32,
    pub unique_skills: usize,
}

impl Snapshot {
    pub fn load(data_dir: &Path, fallback: FallbackConfig) -> Result<Self> {
        let store = EntityStore::load_dir(data_dir, &fallback)?;
        let snapshot = Self::from_store(store, fallback);
        let summary = snapshot.summary();
        info!(
            students = summary.total_students,
            courses = summary.total_courses,
            enrollments = summary.total_enrollments,
            "snapshot built"
        );
        Ok(snapshot)
    }

    pub fn from_store(store: EntityStore, fallback: FallbackConfig) -> Self {
        let stats = AggregateStats::from_enrollments(store.enrollments(), fallback);
        Self { store, stats }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    pub fn features(&self) -> FeatureBuilder<'_> {
        FeatureBuilder::new(&self.store, &self.stats)
    }

    /// Counts for /stats. Student and course totals count entities observed
    /// in the enrollment table, matching the original diagnostic endpoint.
    pub fn summary(&self) -> SnapshotSummary {
        let enrollments = self.store.enrollments();
        let students: HashSet<_> = enrollments.iter().map(|e| e.student_id).collect();
        let courses: HashSet<_> = enrollments.iter().map(|e| e.course_id).collect();
        let completed = enrollments.iter().filter(|e| e.completed).count();
        let completion_rate = if enrollments.is_empty() {
            0.0
        } else {
            completed as f32 / enrollments.len() as f32
        };

        SnapshotSummary {
            total_students: students.len(),
            total_courses: courses.len(),
            total_enrollments: enrollments.len(),
            completion_rate,
            unique_skills: self.store.unique_student_skill_count(),
        }
    }
}

/// Shared handle over the current snapshot. Readers clone the `Arc` and
/// keep a consistent view for the whole request; `replace` swaps the
/// pointer for subsequent requests.
pub struct SnapshotHandle {
    inner: RwLock<Arc<Snapshot>>,
}

impl SnapshotHandle {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            inner: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn replace(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        match self.inner.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Enrollment;

    fn enrollment(student_id: u32, course_id: u32, completed: bool) -> Enrollment {
        Enrollment {
            student_id,
            course_id,
            progress_percentage: 50.0,
            completed,
            completed_at: None,
        }
    }

    fn snapshot() -> Snapshot {
        let store = EntityStore::from_tables(
            vec![
                enrollment(1, 10, true),
                enrollment(1, 11, false),
                enrollment(2, 10, false),
                enrollment(3, 12, true),
            ],
            vec![(1, "Python".to_string()), (2, "SQL".to_string())],
            vec![(10, "Python".to_string())],
        );
        Snapshot::from_store(store, FallbackConfig::default())
    }

    #[test]
    fn summary_counts_enrollment_observed_entities() {
        let summary = snapshot().summary();
        assert_eq!(summary.total_students, 3);
        assert_eq!(summary.total_courses, 3);
        assert_eq!(summary.total_enrollments, 4);
        assert_eq!(summary.completion_rate, 0.5);
        assert_eq!(summary.unique_skills, 2);
    }

    #[test]
    fn handle_swap_changes_subsequent_reads() {
        let handle = SnapshotHandle::new(snapshot());
        let before = handle.current();
        assert_eq!(before.summary().total_enrollments, 4);

        let empty = Snapshot::from_store(
            EntityStore::from_tables(vec![], vec![], vec![]),
            FallbackConfig::default(),
        );
        handle.replace(empty);

        // The old Arc still serves its in-flight view
        assert_eq!(before.summary().total_enrollments, 4);
        assert_eq!(handle.current().summary().total_enrollments, 0);
    }
}
