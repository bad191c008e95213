use super::{GestureLabel, OverlayPoint};
use serde::Serialize;

/// How a `process` call ended. Only `Detected` carries a primary gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    Detected,
    /// Hands were found but none produced a gesture
    NoGesture,
    NoHands,
    DetectorUnavailable,
}

/// Classification of a single hand within a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandResult {
    pub hand_index: usize,
    pub gesture: GestureLabel,
    pub confidence: f32,
    pub raw_confidence: f32,
    pub class_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub status: DetectionStatus,
    pub primary_gesture: Option<GestureLabel>,
    pub primary_confidence: f32,
    /// Overlay points of every processed hand, concatenated in detection order
    pub landmarks: Vec<OverlayPoint>,
    pub hands: Vec<HandResult>,
}

impl PipelineResult {
    pub fn no_hands() -> Self {
        Self::empty(DetectionStatus::NoHands)
    }

    pub fn detector_unavailable() -> Self {
        Self::empty(DetectionStatus::DetectorUnavailable)
    }

    /// Build the result from every processed hand. The primary is the first classified one.
    pub fn from_hands(hands: Vec<HandResult>, landmarks: Vec<OverlayPoint>) -> Self {
        match hands.first() {
            Some(primary) => Self {
                status: DetectionStatus::Detected,
                primary_gesture: Some(primary.gesture.clone()),
                primary_confidence: primary.confidence,
                landmarks,
                hands,
            },
            // Hands without a gesture report nothing to overlay either
            None => Self::empty(DetectionStatus::NoGesture),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.status == DetectionStatus::DetectorUnavailable
    }

    fn empty(status: DetectionStatus) -> Self {
        Self {
            status,
            primary_gesture: None,
            primary_confidence: 0.0,
            landmarks: Vec::new(),
            hands: Vec::new(),
        }
    }
}
