/// Scoring Function
///
/// The collaborator that turns feature matrices into completion
/// probabilities. Two named strategies exist and are selected at startup:
/// the trained ONNX classifier (`ModelScorer`) and the deterministic demo
/// formula from the original standalone server (`HeuristicScorer`). They
/// are kept as distinct strategies on purpose; the heuristic is not an
/// approximation of the model.
mod heuristic;
mod model;

use ndarray::Array2;
use std::sync::Arc;
use tracing::{info, warn};

pub use heuristic::HeuristicScorer;
pub use model::ModelScorer;

use crate::config::ModelConfig;
use crate::error::{AppError, Result};
use crate::services::features::FEATURE_VECTOR_SIZE;

pub trait Scorer: Send + Sync {
    /// Score a batch of feature rows. Returns one probability in [0, 1]
    /// per row, in row order.
    fn score_batch(&self, features: &Array2<f32>) -> Result<Vec<f32>>;

    fn name(&self) -> &'static str;
}

pub(crate) fn check_width(features: &Array2<f32>) -> Result<()> {
    if features.shape()[1] != FEATURE_VECTOR_SIZE {
        return Err(AppError::Scoring(format!(
            "expected {} features per row, got {}",
            FEATURE_VECTOR_SIZE,
            features.shape()[1]
        )));
    }
    Ok(())
}

/// Select the scoring strategy: the trained model when its artifacts load,
/// otherwise the heuristic with a warning.
pub fn load_scorer(config: &ModelConfig) -> Arc<dyn Scorer> {
    match ModelScorer::load(&config.onnx_model_path, &config.scaler_path) {
        Ok(scorer) => {
            info!(model = %config.onnx_model_path, "loaded ONNX scoring model");
            Arc::new(scorer)
        }
        Err(e) => {
            warn!(
                model = %config.onnx_model_path,
                error = %e,
                "model unavailable, falling back to heuristic scoring"
            );
            Arc::new(HeuristicScorer::new())
        }
    }
}
