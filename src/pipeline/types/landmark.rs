use serde::{Deserialize, Serialize};

/// Number of anatomical points reported per hand
pub const HAND_LANDMARK_COUNT: usize = 21;

/// One detected point. `x`/`y` are normalized to the image, `z` is relative depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn overlay(&self) -> OverlayPoint {
        OverlayPoint {
            x: self.x,
            y: self.y,
        }
    }
}

impl From<[f32; 3]> for LandmarkPoint {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// 2D point handed back to callers for overlay rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPoint {
    pub x: f32,
    pub y: f32,
}

/// Ordered landmarks of one detected hand, in detector order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: Vec<LandmarkPoint>,
}

impl LandmarkSet {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A set is usable only with exactly one point per hand landmark
    pub fn is_complete(&self) -> bool {
        self.points.len() == HAND_LANDMARK_COUNT
    }

    pub fn overlay_points(&self) -> impl Iterator<Item = OverlayPoint> + '_ {
        self.points.iter().map(LandmarkPoint::overlay)
    }
}

impl From<Vec<LandmarkPoint>> for LandmarkSet {
    fn from(points: Vec<LandmarkPoint>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<LandmarkPoint> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = LandmarkPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
