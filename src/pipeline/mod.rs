pub mod services;
pub mod types;

pub use services::{GesturePipeline, PipelineManager};
pub use types::{DetectionStatus, GestureLabel, PipelineResult, SessionId};
