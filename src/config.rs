use crate::error::AppError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "GESTURE";
pub const DEFAULT_CONFIG_PATH: &str = "config/default";

/// Top level settings, layered as defaults -> optional file -> `GESTURE__*` env vars.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pipeline: PipelineConfiguration,
    pub models: ModelSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from `path` (extension optional, missing file is fine) and the environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_string_lossy().into_owned();
        let settings: Settings = Config::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("models.classifier_paths"),
            )
            .build()?
            .try_deserialize()?;

        settings.pipeline.validate()?;
        Ok(settings)
    }
}

/// Tunables of the recognition pipeline itself
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfiguration {
    pub scale_factor: f32,
    pub max_hands: usize,
    pub min_payload_len: usize,
    pub min_hand_confidence: f32,
    pub smoothing_enabled: bool,
    pub smoothing_window: usize,
    pub max_sessions: usize,
    pub history_capacity: usize,
    pub history_page: usize,
    pub detection_caching: bool,
}

impl Default for PipelineConfiguration {
    fn default() -> Self {
        Self {
            scale_factor: 0.6,
            max_hands: 2,
            min_payload_len: 50,
            min_hand_confidence: 0.5,
            smoothing_enabled: false,
            smoothing_window: 5,
            max_sessions: 256,
            history_capacity: 50,
            history_page: 10,
            detection_caching: false,
        }
    }
}

impl PipelineConfiguration {
    /// Create configuration optimized for throughput
    pub fn performance_optimized() -> Self {
        Self {
            scale_factor: 0.5,     // Smaller frames for the detector
            detection_caching: true,
            history_capacity: 50,
            ..Self::default()
        }
    }

    /// Create configuration optimized for debugging
    pub fn debug_optimized() -> Self {
        Self {
            scale_factor: 1.0, // Full resolution, no reduction
            smoothing_enabled: false,
            detection_caching: false, // Every frame hits the classifier
            ..Self::default()
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 || self.scale_factor > 1.0 {
            return Err(AppError::InvalidConfig(format!(
                "Scale factor must be in (0, 1], got {}",
                self.scale_factor
            )));
        }

        if self.max_hands == 0 {
            return Err(AppError::InvalidConfig(
                "Max hands must be greater than 0".to_string(),
            ));
        }

        if self.min_payload_len == 0 {
            return Err(AppError::InvalidConfig(
                "Minimum payload length must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.min_hand_confidence) {
            return Err(AppError::InvalidConfig(
                "Minimum hand confidence must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.smoothing_window == 0 {
            return Err(AppError::InvalidConfig(
                "Smoothing window must be greater than 0".to_string(),
            ));
        }

        if self.max_sessions == 0 {
            return Err(AppError::InvalidConfig(
                "Max sessions must be greater than 0".to_string(),
            ));
        }

        if self.history_capacity == 0 {
            return Err(AppError::InvalidConfig(
                "History capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Where the model artifacts live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub landmarker_path: PathBuf,
    /// Proposes the hand regions the landmarker runs on
    pub palm_detector_path: PathBuf,
    /// Tried in order, the first artifact that loads wins
    pub classifier_paths: Vec<PathBuf>,
    pub label_map_path: PathBuf,
    pub compound_label: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            landmarker_path: PathBuf::from("hand_landmarker.onnx"),
            palm_detector_path: PathBuf::from("palm_detection.onnx"),
            classifier_paths: vec![
                PathBuf::from("gesture_classifier.json"),
                PathBuf::from("indian_gesture_classifier.json"),
            ],
            label_map_path: PathBuf::from("gesture_class_map.json"),
            compound_label: "LOVE_YOU".to_string(),
        }
    }
}

/// How the request boundary reports an unavailable model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnavailablePolicy {
    /// Answer 200 with a null gesture
    Degraded,
    /// Answer 500 with an error body
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub unavailable_policy: UnavailablePolicy,
    pub request_timeout_ms: u64,
    pub max_in_flight: usize,
    pub preload_models: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            unavailable_policy: UnavailablePolicy::Error,
            request_timeout_ms: 5_000,
            max_in_flight: 8,
            preload_models: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
