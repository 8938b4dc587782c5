pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

// Re-export the pieces the binary and integration tests wire together
pub use services::{
    load_scorer, AggregateStats, EntityStore, FeatureBuilder, HeuristicScorer, ModelScorer,
    RecommendationEngine, Scorer, Snapshot, SnapshotHandle,
};
