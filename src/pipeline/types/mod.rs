mod classification;
mod feature_vector;
mod gesture_label;
mod history_entry;
mod landmark;
mod pipeline_result;
mod session;

pub use classification::ClassificationResult;
pub use feature_vector::{FEATURE_LEN, FeatureVector};
pub use gesture_label::GestureLabel;
pub use history_entry::{HistoryEntry, HistoryEntryBuilder};
pub use landmark::{HAND_LANDMARK_COUNT, LandmarkPoint, LandmarkSet, OverlayPoint};
pub use pipeline_result::{DetectionStatus, HandResult, PipelineResult};
pub use session::SessionId;
