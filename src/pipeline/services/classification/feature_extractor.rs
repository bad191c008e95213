use crate::error::StageError;
use crate::pipeline::types::{FeatureVector, LandmarkSet};

/// Flattens landmark sets into classifier input.
///
/// Coordinates are used exactly as the detector reported them, point by point as
/// `x, y, z`. No centering or scaling: the classifier was fit on raw detector output.
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn try_extract(landmarks: &LandmarkSet) -> Result<FeatureVector, StageError> {
        let flat: Vec<f32> = landmarks
            .points()
            .iter()
            .flat_map(|p| [p.x, p.y, p.z])
            .collect();
        FeatureVector::try_from(flat)
    }

    /// `None` for any set that does not flatten to exactly 63 values
    pub fn extract(landmarks: &LandmarkSet) -> Option<FeatureVector> {
        Self::try_extract(landmarks).ok()
    }
}
