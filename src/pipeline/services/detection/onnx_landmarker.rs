use super::LandmarkDetector;
use super::letterbox::Letterbox;
use super::palm_detector::{CropRect, OrtPalmDetector};
use crate::error::{ModelError, StageError};
use crate::pipeline::types::{HAND_LANDMARK_COUNT, LandmarkPoint, LandmarkSet};
use image::RgbImage;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

const INPUT_SIZE: u32 = 224;

/// Two-stage hand landmarker served through ONNX Runtime.
///
/// A palm detector proposes hand regions; the landmark model then runs once per
/// region crop. The landmark model expects an NHWC `[1, 224, 224, 3]` float input
/// in `[0, 1]` and produces 21 × (x, y, z) in input pixels plus a presence score.
pub struct OrtHandLandmarker {
    palms: OrtPalmDetector,
    session: Mutex<Session>,
    min_confidence: f32,
}

impl OrtHandLandmarker {
    pub fn load(
        model_path: &Path,
        palm_model_path: &Path,
        min_confidence: f32,
    ) -> Result<Self, ModelError> {
        if !model_path.exists() {
            return Err(ModelError::MissingArtifact(model_path.to_path_buf()));
        }
        let palms = OrtPalmDetector::load(palm_model_path, min_confidence)?;

        let load_err = |e: ort::Error| ModelError::Load {
            path: model_path.to_path_buf(),
            reason: e.to_string(),
        };
        let session = Session::builder()
            .map_err(load_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_err)?
            .with_intra_threads(2)
            .map_err(load_err)?
            .commit_from_file(model_path)
            .map_err(load_err)?;

        info!("Hand landmarker ready using {}", model_path.display());
        Ok(Self {
            palms,
            session: Mutex::new(session),
            min_confidence,
        })
    }

    /// Landmarks for one hand crop, `None` when the model sees no hand in it
    fn landmarks_in(
        &self,
        image: &RgbImage,
        crop: CropRect,
    ) -> Result<Option<LandmarkSet>, StageError> {
        let region = image::imageops::crop_imm(image, crop.x, crop.y, crop.width, crop.height)
            .to_image();
        let (input, letterbox) = Letterbox::fit(&region, INPUT_SIZE);
        let tensor =
            Tensor::from_array(input).map_err(|e| StageError::Detection(e.to_string()))?;

        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| StageError::Detection(e.to_string()))?;

        if outputs.len() < 1 {
            return Err(StageError::Detection("model returned no outputs".to_string()));
        }

        let presence = if outputs.len() > 1 {
            outputs[1]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|arr| arr.iter().next().copied())
                .unwrap_or(0.0)
        } else {
            1.0
        };
        if presence < self.min_confidence {
            debug!("Hand presence {:.2} below threshold", presence);
            return Ok(None);
        }

        let coords = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| StageError::Detection(e.to_string()))?;
        let flat: Vec<f32> = coords.iter().copied().collect();

        normalize(&flat, &letterbox, crop, image.width(), image.height()).map(Some)
    }
}

/// Model pixels inside `crop` -> coordinates normalized to the whole frame
fn normalize(
    flat: &[f32],
    letterbox: &Letterbox,
    crop: CropRect,
    frame_w: u32,
    frame_h: u32,
) -> Result<LandmarkSet, StageError> {
    if flat.len() < HAND_LANDMARK_COUNT * 3 {
        return Err(StageError::Detection(format!(
            "unexpected landmarks length: got {}, need {}",
            flat.len(),
            HAND_LANDMARK_COUNT * 3
        )));
    }

    Ok(flat
        .chunks_exact(3)
        .take(HAND_LANDMARK_COUNT)
        .map(|c| {
            let (px, py) = letterbox.to_source(c[0], c[1]);
            LandmarkPoint::new(
                ((crop.x as f32 + px) / frame_w as f32).clamp(0.0, 1.0),
                ((crop.y as f32 + py) / frame_h as f32).clamp(0.0, 1.0),
                c[2] / INPUT_SIZE as f32,
            )
        })
        .collect())
}

impl LandmarkDetector for OrtHandLandmarker {
    fn detect(&self, image: &RgbImage, max_hands: usize) -> Result<Vec<LandmarkSet>, StageError> {
        if max_hands == 0 {
            return Ok(Vec::new());
        }

        let palms = self.palms.detect(image, max_hands)?;
        let mut hands = Vec::with_capacity(palms.len());
        for palm in palms {
            let Some(crop) = palm.hand_crop(image.width(), image.height()) else {
                continue;
            };
            if let Some(landmarks) = self.landmarks_in(image, crop)? {
                hands.push(landmarks);
            }
        }
        debug!("Detected {} hand(s)", hands.len());
        Ok(hands)
    }

    fn name(&self) -> &'static str {
        "ort-hand-landmarker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_at(x: f32, y: f32) -> Vec<f32> {
        (0..HAND_LANDMARK_COUNT).flat_map(|_| [x, y, 0.0]).collect()
    }

    #[test]
    fn crop_landmarks_map_back_to_the_frame() {
        // 100x50 crop at (200, 100) in a 400x300 frame: scale 2.24, 56px vertical pad
        let crop = CropRect {
            x: 200,
            y: 100,
            width: 100,
            height: 50,
        };
        let letterbox = Letterbox::for_dimensions(crop.width, crop.height, INPUT_SIZE);
        let (ix, iy) = letterbox.to_input(50.0, 25.0);

        let set = normalize(&flat_at(ix, iy), &letterbox, crop, 400, 300).unwrap();
        assert_eq!(set.len(), HAND_LANDMARK_COUNT);
        let point = set.points()[0];
        assert!((point.x - 250.0 / 400.0).abs() < 1e-4);
        assert!((point.y - 125.0 / 300.0).abs() < 1e-4);
    }

    #[test]
    fn coordinates_outside_the_frame_are_clamped() {
        let crop = CropRect {
            x: 0,
            y: 0,
            width: 224,
            height: 224,
        };
        let letterbox = Letterbox::for_dimensions(224, 224, INPUT_SIZE);
        let set = normalize(&flat_at(-30.0, 500.0), &letterbox, crop, 224, 224).unwrap();
        assert_eq!(set.points()[0].x, 0.0);
        assert_eq!(set.points()[0].y, 1.0);
    }

    #[test]
    fn short_landmark_output_is_a_detection_fault() {
        let crop = CropRect {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        };
        let letterbox = Letterbox::for_dimensions(10, 10, INPUT_SIZE);
        assert!(matches!(
            normalize(&[0.0; 30], &letterbox, crop, 10, 10),
            Err(StageError::Detection(_))
        ));
    }
}
