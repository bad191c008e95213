use image::{Rgb, RgbImage, imageops::FilterType};
use ndarray::Array4;

/// Aspect-preserving fit of a frame into a square model input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub size: u32,
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

impl Letterbox {
    pub fn for_dimensions(width: u32, height: u32, size: u32) -> Self {
        let scale = size as f32 / width.max(height).max(1) as f32;
        let new_w = (width as f32 * scale).round().max(1.0) as u32;
        let new_h = (height as f32 * scale).round().max(1.0) as u32;
        Self {
            size,
            scale,
            pad_x: (size.saturating_sub(new_w) / 2) as f32,
            pad_y: (size.saturating_sub(new_h) / 2) as f32,
            orig_w: width,
            orig_h: height,
        }
    }

    /// Resize and pad `image` into an NHWC `[1, size, size, 3]` tensor in `[0, 1]`.
    pub fn fit(image: &RgbImage, size: u32) -> (Array4<f32>, Self) {
        let letterbox = Self::for_dimensions(image.width(), image.height(), size);
        let new_w = (image.width() as f32 * letterbox.scale).round().max(1.0) as u32;
        let new_h = (image.height() as f32 * letterbox.scale).round().max(1.0) as u32;
        let resized = image::imageops::resize(image, new_w, new_h, FilterType::CatmullRom);

        let mut canvas = RgbImage::from_pixel(size, size, Rgb([0, 0, 0]));
        image::imageops::overlay(
            &mut canvas,
            &resized,
            letterbox.pad_x as i64,
            letterbox.pad_y as i64,
        );

        let side = size as usize;
        let mut input = Array4::<f32>::zeros((1, side, side, 3));
        for (x, y, pixel) in canvas.enumerate_pixels() {
            for channel in 0..3 {
                input[[0, y as usize, x as usize, channel]] = pixel.0[channel] as f32 / 255.0;
            }
        }
        (input, letterbox)
    }

    /// Model input pixels -> source pixels
    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.pad_x) / self.scale,
            (y - self.pad_y) / self.scale,
        )
    }

    /// Source pixels -> model input pixels
    pub fn to_input(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale + self.pad_x, y * self.scale + self.pad_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_frame_is_padded_vertically() {
        let letterbox = Letterbox::for_dimensions(320, 240, 224);
        assert!((letterbox.scale - 0.7).abs() < 1e-6);
        assert_eq!(letterbox.pad_x, 0.0);
        assert_eq!(letterbox.pad_y, 28.0);

        let (x, y) = letterbox.to_source(112.0, 28.0);
        assert!((x - 160.0).abs() < 1e-3);
        assert!(y.abs() < 1e-3);
    }

    #[test]
    fn source_and_input_coordinates_round_trip() {
        let letterbox = Letterbox::for_dimensions(90, 200, 192);
        for (x, y) in [(0.0, 0.0), (45.0, 100.0), (89.0, 199.0)] {
            let (ix, iy) = letterbox.to_input(x, y);
            let (sx, sy) = letterbox.to_source(ix, iy);
            assert!((sx - x).abs() < 1e-3 && (sy - y).abs() < 1e-3);
        }
    }

    #[test]
    fn fit_produces_a_padded_unit_range_tensor() {
        let image = RgbImage::from_pixel(320, 240, Rgb([255, 255, 255]));
        let (input, letterbox) = Letterbox::fit(&image, 224);

        assert_eq!(input.shape(), &[1, 224, 224, 3]);
        // Padding rows stay black, the frame itself is white
        assert_eq!(input[[0, 0, 112, 0]], 0.0);
        assert!((input[[0, 112, 112, 0]] - 1.0).abs() < 1e-6);
        assert_eq!(letterbox.orig_h, 240);
    }
}
