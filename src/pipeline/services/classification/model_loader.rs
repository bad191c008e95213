use super::classifier::{ClassifierArtifact, GestureClassifier};
use super::label_table::LabelTable;
use crate::config::ModelSettings;
use crate::error::ModelError;
use crate::pipeline::services::detection::LandmarkDetector;
use std::path::PathBuf;
use tracing::{info, warn};

/// Everything the pipeline needs once initialization succeeds
pub struct LoadedModels {
    pub detector: Box<dyn LandmarkDetector>,
    pub classifier: Box<dyn GestureClassifier>,
    pub labels: LabelTable,
    pub classifier_source: PathBuf,
}

/// Loads the detector and classifier. Called at most once per pipeline.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<LoadedModels, ModelError>;
}

impl<F> ModelLoader for F
where
    F: Fn() -> Result<LoadedModels, ModelError> + Send + Sync,
{
    fn load(&self) -> Result<LoadedModels, ModelError> {
        self()
    }
}

/// One classifier candidate, with the label mapping that belongs to it.
/// Without a mapping the default alphabet is used.
#[derive(Debug, Clone)]
pub struct ClassifierStrategy {
    pub artifact: PathBuf,
    pub label_map: Option<PathBuf>,
}

pub struct LoadedClassifier {
    pub classifier: ClassifierArtifact,
    pub labels: LabelTable,
    pub source: PathBuf,
}

/// Try each strategy in order and keep the first classifier that loads.
pub fn load_classifier(
    strategies: &[ClassifierStrategy],
    compound_label: &str,
) -> Result<LoadedClassifier, ModelError> {
    for (attempt, strategy) in strategies.iter().enumerate() {
        info!(
            "Loading classifier (strategy {}/{}) from {}",
            attempt + 1,
            strategies.len(),
            strategy.artifact.display()
        );

        let classifier = match ClassifierArtifact::load(&strategy.artifact) {
            Ok(classifier) => classifier,
            Err(e) => {
                warn!("Classifier strategy {} failed: {}", attempt + 1, e);
                continue;
            }
        };

        let labels = match &strategy.label_map {
            Some(path) => LabelTable::load(path, compound_label).unwrap_or_else(|e| {
                warn!("Label mapping unusable ({}), using default alphabet", e);
                LabelTable::default_alphabet(compound_label)
            }),
            None => LabelTable::default_alphabet(compound_label),
        };

        if labels.len() < classifier.class_count() {
            warn!(
                "Classifier has {} classes but only {} labels; extra classes resolve to Unknown",
                classifier.class_count(),
                labels.len()
            );
        }

        info!(
            "Classifier loaded: {} with {} classes, {} labels",
            classifier.name(),
            classifier.class_count(),
            labels.len()
        );
        return Ok(LoadedClassifier {
            classifier,
            labels,
            source: strategy.artifact.clone(),
        });
    }

    Err(ModelError::Exhausted {
        attempts: strategies.len(),
    })
}

#[cfg(feature = "onnx")]
pub fn load_detector(
    settings: &ModelSettings,
    min_confidence: f32,
) -> Result<Box<dyn LandmarkDetector>, ModelError> {
    use crate::pipeline::services::detection::OrtHandLandmarker;

    let landmarker = OrtHandLandmarker::load(
        &settings.landmarker_path,
        &settings.palm_detector_path,
        min_confidence,
    )?;
    Ok(Box::new(landmarker))
}

#[cfg(not(feature = "onnx"))]
pub fn load_detector(
    settings: &ModelSettings,
    _min_confidence: f32,
) -> Result<Box<dyn LandmarkDetector>, ModelError> {
    Err(ModelError::DetectorUnavailable(format!(
        "{} requires the `onnx` feature",
        settings.landmarker_path.display()
    )))
}

/// Loads models from the artifact paths in `ModelSettings`.
///
/// The first classifier path is paired with the configured label mapping, later
/// paths fall back to the default alphabet.
pub struct ArtifactModelLoader {
    settings: ModelSettings,
    min_hand_confidence: f32,
}

impl ArtifactModelLoader {
    pub fn new(settings: ModelSettings, min_hand_confidence: f32) -> Self {
        Self {
            settings,
            min_hand_confidence,
        }
    }

    pub fn strategies(&self) -> Vec<ClassifierStrategy> {
        self.settings
            .classifier_paths
            .iter()
            .enumerate()
            .map(|(i, artifact)| ClassifierStrategy {
                artifact: artifact.clone(),
                label_map: (i == 0).then(|| self.settings.label_map_path.clone()),
            })
            .collect()
    }
}

impl ModelLoader for ArtifactModelLoader {
    fn load(&self) -> Result<LoadedModels, ModelError> {
        let detector = load_detector(&self.settings, self.min_hand_confidence)?;
        let loaded = load_classifier(&self.strategies(), &self.settings.compound_label)?;

        Ok(LoadedModels {
            detector,
            classifier: Box::new(loaded.classifier),
            labels: loaded.labels,
            classifier_source: loaded.source,
        })
    }
}
