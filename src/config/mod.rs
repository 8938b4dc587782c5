use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub data: DataConfig,
    pub model: ModelConfig,
    pub fallback: FallbackConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub http_port: u16,
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Directory holding enrollments.csv, student_skills.csv, course_skills.csv
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub onnx_model_path: String,
    pub scaler_path: String,
}

/// Defaults used for students/courses with no enrollment history.
///
/// These are the single source of the fallback constants; nothing else in
/// the crate hardcodes them. `difficulty` for an unseen course is derived
/// as `1.0 - completion_rate`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FallbackConfig {
    pub completion_rate: f32,
    pub avg_progress: f32,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            completion_rate: 0.5,
            avg_progress: 50.0,
        }
    }
}

impl FallbackConfig {
    pub fn difficulty(&self) -> f32 {
        1.0 - self.completion_rate
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        Ok(Config {
            service: ServiceConfig {
                http_port: env::var("HTTP_PORT")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()?,
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "course-recommendation-service".to_string()),
            },
            data: DataConfig {
                data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            },
            model: ModelConfig {
                onnx_model_path: env::var("ONNX_MODEL_PATH")
                    .unwrap_or_else(|_| "./models/recommendation_model.onnx".to_string()),
                scaler_path: env::var("SCALER_PATH")
                    .unwrap_or_else(|_| "./models/scaler.json".to_string()),
            },
            fallback: FallbackConfig {
                completion_rate: env::var("FALLBACK_COMPLETION_RATE")
                    .unwrap_or_else(|_| "0.5".to_string())
                    .parse()?,
                avg_progress: env::var("FALLBACK_AVG_PROGRESS")
                    .unwrap_or_else(|_| "50.0".to_string())
                    .parse()?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_defaults() {
        let fallback = FallbackConfig::default();
        assert_eq!(fallback.completion_rate, 0.5);
        assert_eq!(fallback.avg_progress, 50.0);
        assert_eq!(fallback.difficulty(), 0.5);
    }
}
