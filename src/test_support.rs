//! Fixtures shared by unit tests across the crate.

use crate::error::StageError;
use crate::pipeline::services::classification::{GestureClassifier, LabelTable, LoadedModels};
use crate::pipeline::services::detection::LandmarkDetector;
use crate::pipeline::types::{
    ClassificationResult, FeatureVector, HAND_LANDMARK_COUNT, LandmarkPoint, LandmarkSet,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Base64 PNG of a `width` x `height` gradient
pub(crate) fn encode_png(width: u32, height: u32) -> String {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 128])
    });
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("png encoding");
    STANDARD.encode(bytes.into_inner())
}

pub(crate) fn encode_png_data_uri(width: u32, height: u32) -> String {
    format!("data:image/png;base64,{}", encode_png(width, height))
}

/// A complete hand whose first coordinate is `marker`
pub(crate) fn hand(marker: f32) -> LandmarkSet {
    (0..HAND_LANDMARK_COUNT)
        .map(|i| {
            let x = if i == 0 { marker } else { 0.5 };
            LandmarkPoint::new(x, 0.25 + i as f32 * 0.01, 0.0)
        })
        .collect()
}

/// A hand with fewer points than a complete set
pub(crate) fn partial_hand() -> LandmarkSet {
    (0..HAND_LANDMARK_COUNT - 3)
        .map(|_| LandmarkPoint::new(0.4, 0.4, 0.0))
        .collect()
}

/// Detector returning a fixed set of hands, counting its invocations
pub(crate) struct FakeDetector {
    hands: Vec<LandmarkSet>,
    fail: bool,
    panic: bool,
    calls: Arc<AtomicUsize>,
}

impl FakeDetector {
    pub(crate) fn with_hands(hands: Vec<LandmarkSet>) -> Self {
        Self {
            hands,
            fail: false,
            panic: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_hands(Vec::new())
        }
    }

    pub(crate) fn panicking() -> Self {
        Self {
            panic: true,
            ..Self::with_hands(Vec::new())
        }
    }

    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl LandmarkDetector for FakeDetector {
    fn detect(&self, _image: &RgbImage, max_hands: usize) -> Result<Vec<LandmarkSet>, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic {
            panic!("detector runtime aborted");
        }
        if self.fail {
            return Err(StageError::Detection("runtime fault".to_string()));
        }
        Ok(self.hands.iter().take(max_hands).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "fake-detector"
    }
}

/// Classifier keyed on the first feature value: `(marker, class_index, confidence)`.
/// Unknown markers are a classifier fault.
pub(crate) struct MarkerClassifier {
    outcomes: Vec<(f32, usize, f32)>,
    n_classes: usize,
    calls: Arc<AtomicUsize>,
}

impl MarkerClassifier {
    pub(crate) fn new(outcomes: Vec<(f32, usize, f32)>) -> Self {
        Self {
            outcomes,
            n_classes: 45,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl GestureClassifier for MarkerClassifier {
    fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let marker = features.as_slice()[0];
        let (_, class_index, confidence) = self
            .outcomes
            .iter()
            .find(|(m, _, _)| (m - marker).abs() < 1e-6)
            .copied()
            .ok_or_else(|| StageError::ClassifierFault(format!("no outcome for {marker}")))?;

        let mut probabilities = vec![0.0; self.n_classes];
        if confidence > 0.0 {
            let rest = (1.0 - confidence) / (self.n_classes - 1) as f32;
            probabilities.iter_mut().for_each(|p| *p = rest);
            probabilities[class_index] = confidence;
        }
        ClassificationResult::from_probabilities(probabilities)
    }

    fn class_count(&self) -> usize {
        self.n_classes
    }

    fn name(&self) -> &'static str {
        "marker-classifier"
    }
}

pub(crate) fn loaded_models(detector: FakeDetector, classifier: MarkerClassifier) -> LoadedModels {
    LoadedModels {
        detector: Box::new(detector),
        classifier: Box::new(classifier),
        labels: LabelTable::default(),
        classifier_source: PathBuf::from("memory"),
    }
}
