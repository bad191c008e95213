use crate::error::StageError;
use crate::pipeline::types::LandmarkSet;
use image::RgbImage;

/// Hand landmark detection capability.
///
/// Implementations return at most `max_hands` landmark sets, in the order the
/// underlying model reports them. Returning an empty vector means no hands.
pub trait LandmarkDetector: Send + Sync {
    fn detect(&self, image: &RgbImage, max_hands: usize) -> Result<Vec<LandmarkSet>, StageError>;
    fn name(&self) -> &'static str;
}

impl<D: LandmarkDetector + ?Sized> LandmarkDetector for Box<D> {
    fn detect(&self, image: &RgbImage, max_hands: usize) -> Result<Vec<LandmarkSet>, StageError> {
        (**self).detect(image, max_hands)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
