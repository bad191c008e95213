pub mod confidence_smoother;
pub mod gesture_history;
pub mod prediction_cache;

pub use confidence_smoother::{ConfidenceSmoother, DEFAULT_SMOOTHING_WINDOW};
pub use gesture_history::{DEFAULT_HISTORY_CAPACITY, GestureHistory};
pub use prediction_cache::PredictionCache;
