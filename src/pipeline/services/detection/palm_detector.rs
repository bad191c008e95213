use super::letterbox::Letterbox;
use crate::error::{ModelError, StageError};
use image::RgbImage;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

pub const PALM_INPUT_SIZE: u32 = 192;
const REGRESSOR_STRIDE: usize = 18;
const NMS_IOU_THRESHOLD: f32 = 0.3;
// Palm box -> hand region
const HAND_REGION_SCALE: f32 = 2.6;
const HAND_REGION_SHIFT_Y: f32 = -0.5;

/// A detected palm in source frame pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PalmRegion {
    pub cx: f32,
    pub cy: f32,
    pub width: f32,
    pub height: f32,
    pub score: f32,
}

/// Pixel rectangle of a hand crop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PalmRegion {
    fn corners(&self) -> (f32, f32, f32, f32) {
        (
            self.cx - self.width / 2.0,
            self.cy - self.height / 2.0,
            self.cx + self.width / 2.0,
            self.cy + self.height / 2.0,
        )
    }

    pub fn iou(&self, other: &PalmRegion) -> f32 {
        let (ax0, ay0, ax1, ay1) = self.corners();
        let (bx0, by0, bx1, by1) = other.corners();
        let inter_w = (ax1.min(bx1) - ax0.max(bx0)).max(0.0);
        let inter_h = (ay1.min(by1) - ay0.max(by0)).max(0.0);
        let inter = inter_w * inter_h;
        let union = self.width * self.height + other.width * other.height - inter;
        if union <= 0.0 { 0.0 } else { inter / union }
    }

    /// Square region around the whole hand, clamped to the frame.
    ///
    /// The palm box covers only the palm; the region is enlarged and shifted
    /// toward the fingers. `None` when nothing of it lies inside the frame.
    pub fn hand_crop(&self, frame_w: u32, frame_h: u32) -> Option<CropRect> {
        let side = self.width.max(self.height) * HAND_REGION_SCALE;
        let cy = self.cy + self.height * HAND_REGION_SHIFT_Y;

        let x0 = (self.cx - side / 2.0).max(0.0);
        let y0 = (cy - side / 2.0).max(0.0);
        let x1 = (self.cx + side / 2.0).min(frame_w as f32);
        let y1 = (cy + side / 2.0).min(frame_h as f32);
        if x1 - x0 < 1.0 || y1 - y0 < 1.0 {
            return None;
        }

        let (x, y) = (x0.round(), y0.round());
        Some(CropRect {
            x: x as u32,
            y: y as u32,
            width: (x1.round() - x).max(1.0) as u32,
            height: (y1.round() - y).max(1.0) as u32,
        })
    }
}

/// SSD anchor centers for the 192px palm model, normalized to the input.
///
/// Stride 8 carries 2 anchors per cell, the three stride 16 layers share one
/// grid with 6 anchors per cell: 24*24*2 + 12*12*6 = 2016.
pub fn ssd_anchors(input_size: u32) -> Vec<(f32, f32)> {
    let mut anchors = Vec::new();
    for (stride, per_cell) in [(8u32, 2usize), (16, 6)] {
        let grid = input_size.div_ceil(stride);
        for y in 0..grid {
            for x in 0..grid {
                let cx = (x as f32 + 0.5) / grid as f32;
                let cy = (y as f32 + 0.5) / grid as f32;
                anchors.extend(std::iter::repeat_n((cx, cy), per_cell));
            }
        }
    }
    anchors
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x.clamp(-100.0, 100.0)).exp())
}

/// Turn raw regressors and logits into palm regions above `min_score`, in frame pixels.
pub fn decode_palms(
    regressors: &[f32],
    logits: &[f32],
    anchors: &[(f32, f32)],
    min_score: f32,
    letterbox: &Letterbox,
) -> Result<Vec<PalmRegion>, StageError> {
    if logits.len() < anchors.len() || regressors.len() < anchors.len() * REGRESSOR_STRIDE {
        return Err(StageError::Detection(format!(
            "palm outputs too short for {} anchors: {} regressors, {} scores",
            anchors.len(),
            regressors.len(),
            logits.len()
        )));
    }

    let size = letterbox.size as f32;
    let palms = anchors
        .iter()
        .zip(logits)
        .zip(regressors.chunks_exact(REGRESSOR_STRIDE))
        .filter_map(|((&(ax, ay), &logit), reg)| {
            let score = sigmoid(logit);
            if score < min_score {
                return None;
            }
            let (cx, cy) = letterbox.to_source(reg[0] + ax * size, reg[1] + ay * size);
            Some(PalmRegion {
                cx,
                cy,
                width: reg[2] / letterbox.scale,
                height: reg[3] / letterbox.scale,
                score,
            })
        })
        .collect();
    Ok(palms)
}

/// Greedy NMS, highest score first, keeping at most `limit` regions.
pub fn non_max_suppression(mut palms: Vec<PalmRegion>, limit: usize) -> Vec<PalmRegion> {
    palms.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept: Vec<PalmRegion> = Vec::with_capacity(limit);
    for palm in palms {
        if kept.len() >= limit {
            break;
        }
        if kept.iter().all(|k| k.iou(&palm) < NMS_IOU_THRESHOLD) {
            kept.push(palm);
        }
    }
    kept
}

/// Palm detector served through ONNX Runtime.
///
/// NHWC `[1, 192, 192, 3]` input in `[0, 1]`; outputs `[1, 2016, 18]` box
/// regressors and `[1, 2016, 1]` logits, told apart by size.
pub struct OrtPalmDetector {
    session: Mutex<Session>,
    anchors: Vec<(f32, f32)>,
    min_score: f32,
}

impl OrtPalmDetector {
    pub fn load(model_path: &Path, min_score: f32) -> Result<Self, ModelError> {
        if !model_path.exists() {
            return Err(ModelError::MissingArtifact(model_path.to_path_buf()));
        }

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

        info!("Palm detector ready using {}", model_path.display());
        Ok(Self {
            session: Mutex::new(session),
            anchors: ssd_anchors(PALM_INPUT_SIZE),
            min_score,
        })
    }

    pub fn detect(&self, image: &RgbImage, max_palms: usize) -> Result<Vec<PalmRegion>, StageError> {
        let (input, letterbox) = Letterbox::fit(image, PALM_INPUT_SIZE);
        let tensor =
            Tensor::from_array(input).map_err(|e| StageError::Detection(e.to_string()))?;

        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| StageError::Detection(e.to_string()))?;

        let mut regressors = Vec::new();
        let mut logits = Vec::new();
        for index in 0..outputs.len() {
            let array = outputs[index]
                .try_extract_array::<f32>()
                .map_err(|e| StageError::Detection(e.to_string()))?;
            if array.len() == self.anchors.len() * REGRESSOR_STRIDE {
                regressors = array.iter().copied().collect();
            } else if array.len() == self.anchors.len() {
                logits = array.iter().copied().collect();
            }
        }

        let candidates = decode_palms(
            &regressors,
            &logits,
            &self.anchors,
            self.min_score,
            &letterbox,
        )?;
        let palms = non_max_suppression(candidates, max_palms);
        debug!("Palm detector kept {} region(s)", palms.len());
        Ok(palms)
    }
}
