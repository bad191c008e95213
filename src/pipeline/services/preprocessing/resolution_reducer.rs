use image::RgbImage;
use image::imageops::{self, FilterType};
use std::sync::Arc;
use tracing::{debug, warn};

/// Frame handed to the detector after downscaling, with the factor actually applied.
#[derive(Debug, Clone)]
pub struct ReducedFrame {
    pub image: Arc<RgbImage>,
    pub scale_factor: f32,
}

/// Downscales frames before landmark detection to bound detector latency.
#[derive(Debug, Clone)]
pub struct ResolutionReducer {
    scale_factor: f32,
}

impl ResolutionReducer {
    pub fn new(scale_factor: f32) -> Self {
        Self { scale_factor }
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn reduce(&self, image: &Arc<RgbImage>) -> ReducedFrame {
        Self::reduce_by(image, self.scale_factor)
    }

    /// Scale `image` by `scale_factor`. Anything that cannot be reduced comes back
    /// untouched with a factor of 1.0.
    pub fn reduce_by(image: &Arc<RgbImage>, scale_factor: f32) -> ReducedFrame {
        let unscaled = || ReducedFrame {
            image: Arc::clone(image),
            scale_factor: 1.0,
        };

        if !scale_factor.is_finite() || scale_factor <= 0.0 || scale_factor >= 1.0 {
            return unscaled();
        }

        let (width, height) = image.dimensions();
        let new_width = (width as f32 * scale_factor) as u32;
        let new_height = (height as f32 * scale_factor) as u32;
        if new_width == 0 || new_height == 0 {
            warn!(
                "Cannot reduce {}x{} frame by {}, using original resolution",
                width, height, scale_factor
            );
            return unscaled();
        }

        let resized = imageops::resize(&**image, new_width, new_height, FilterType::Triangle);
        debug!(
            "Reduced frame {}x{} -> {}x{}",
            width, height, new_width, new_height
        );
        ReducedFrame {
            image: Arc::new(resized),
            scale_factor,
        }
    }
}

impl Default for ResolutionReducer {
    fn default() -> Self {
        Self::new(0.6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn frame(width: u32, height: u32) -> Arc<RgbImage> {
        Arc::new(RgbImage::from_pixel(width, height, Rgb([10, 20, 30])))
    }

    #[test]
    fn reduces_by_the_default_factor() {
        let reduced = ResolutionReducer::default().reduce(&frame(640, 480));
        assert_eq!(reduced.image.dimensions(), (384, 288));
        assert_eq!(reduced.scale_factor, 0.6);
    }

    #[test]
    fn degenerate_dimensions_fall_back_to_the_original() {
        let original = frame(1, 1);
        let reduced = ResolutionReducer::default().reduce(&original);
        assert!(Arc::ptr_eq(&reduced.image, &original));
        assert_eq!(reduced.scale_factor, 1.0);
    }

    #[test]
    fn invalid_factors_leave_the_frame_unscaled() {
        let original = frame(100, 100);
        for factor in [0.0, -0.5, 1.0, 2.0, f32::NAN] {
            let reduced = ResolutionReducer::reduce_by(&original, factor);
            assert_eq!(reduced.image.dimensions(), (100, 100));
            assert_eq!(reduced.scale_factor, 1.0);
        }
    }
}
