/// Model scoring strategy.
///
/// Runs the offline-trained completion classifier exported to ONNX. The
/// training pipeline standardized features before the network, so the
/// scaler travels with the model as a JSON artifact (per-feature mean and
/// scale) and is applied here; feature building stays raw everywhere else.
use ndarray::Array2;
use serde::Deserialize;
use std::path::Path;
use tract_onnx::prelude::{tvec, Framework, InferenceModelExt, Tensor};

use crate::error::{AppError, Result};
use crate::services::features::FEATURE_VECTOR_SIZE;
use crate::services::scoring::{check_width, Scorer};

type OnnxPlan = tract_onnx::prelude::SimplePlan<
    tract_onnx::prelude::TypedFact,
    Box<dyn tract_onnx::prelude::TypedOp>,
    tract_onnx::prelude::Graph<tract_onnx::prelude::TypedFact, Box<dyn tract_onnx::prelude::TypedOp>>,
>;

/// Per-feature standardization parameters fitted at training time.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

impl StandardScaler {
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let scaler: StandardScaler = serde_json::from_reader(file)?;
        if scaler.mean.len() != FEATURE_VECTOR_SIZE || scaler.scale.len() != FEATURE_VECTOR_SIZE {
            return Err(AppError::Scoring(format!(
                "scaler expects {} features, artifact has mean={} scale={}",
                FEATURE_VECTOR_SIZE,
                scaler.mean.len(),
                scaler.scale.len()
            )));
        }
        if scaler.scale.iter().any(|s| *s == 0.0) {
            return Err(AppError::Scoring("scaler has a zero scale entry".to_string()));
        }
        Ok(scaler)
    }

    fn transform(&self, features: &Array2<f32>) -> Array2<f32> {
        let mut scaled = features.clone();
        for mut row in scaled.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (*value - self.mean[j]) / self.scale[j];
            }
        }
        scaled
    }
}

pub struct ModelScorer {
    plan: OnnxPlan,
    scaler: StandardScaler,
}

impl ModelScorer {
    /// Load the ONNX plan and its scaler. Errors propagate to the caller;
    /// strategy fallback is decided in `load_scorer`, not here.
    pub fn load<P: AsRef<Path>>(model_path: P, scaler_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(AppError::Scoring(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| AppError::Scoring(format!("failed to load ONNX model: {e}")))?;

        let scaler = StandardScaler::load(scaler_path.as_ref())?;

        Ok(Self { plan, scaler })
    }
}

impl Scorer for ModelScorer {
    fn score_batch(&self, features: &Array2<f32>) -> Result<Vec<f32>> {
        check_width(features)?;
        let batch_size = features.shape()[0];
        if batch_size == 0 {
            return Ok(vec![]);
        }

        let scaled = self.scaler.transform(features);

        let input = tract_onnx::prelude::tract_ndarray::Array2::from_shape_fn(
            (batch_size, FEATURE_VECTOR_SIZE),
            |(i, j)| scaled[[i, j]],
        );

        let outputs = self
            .plan
            .run(tvec![Tensor::from(input.into_dyn()).into()])
            .map_err(|e| AppError::Scoring(format!("ONNX inference failed: {e}")))?;

        let view = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| AppError::Scoring(format!("output extraction failed: {e}")))?;

        let probabilities: Vec<f32> = view.iter().map(|p| p.clamp(0.0, 1.0)).collect();
        if probabilities.len() != batch_size {
            return Err(AppError::Scoring(format!(
                "model returned {} probabilities for {} rows",
                probabilities.len(),
                batch_size
            )));
        }

        Ok(probabilities)
    }

    fn name(&self) -> &'static str {
        "model"
    }
}
