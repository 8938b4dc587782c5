pub mod features;
pub mod recommend;
pub mod scoring;
pub mod snapshot;
pub mod stats;
pub mod store;

pub use features::{FeatureBuilder, FeatureVector, FEATURE_VECTOR_SIZE};
pub use recommend::RecommendationEngine;
pub use scoring::{load_scorer, HeuristicScorer, ModelScorer, Scorer};
pub use snapshot::{Snapshot, SnapshotHandle, SnapshotSummary};
pub use stats::AggregateStats;
pub use store::EntityStore;
