pub mod classification;
pub mod detection;
pub mod orchestration;
pub mod preprocessing;
pub mod temporal;

pub use orchestration::{GesturePipeline, PipelineManager};
