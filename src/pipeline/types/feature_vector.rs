use super::landmark::HAND_LANDMARK_COUNT;
use crate::error::StageError;

/// Classifier input length: x, y, z for every hand landmark
pub const FEATURE_LEN: usize = HAND_LANDMARK_COUNT * 3;

/// Flattened landmark coordinates. Always exactly `FEATURE_LEN` values.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl TryFrom<Vec<f32>> for FeatureVector {
    type Error = StageError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        if values.len() != FEATURE_LEN {
            return Err(StageError::FeatureLengthMismatch {
                expected: FEATURE_LEN,
                actual: values.len(),
            });
        }
        Ok(Self(values))
    }
}
