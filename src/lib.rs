pub mod api;
pub mod common;
pub mod config;
pub mod error;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiResponse, GestureService, ProcessFrameRequest};
pub use crate::config::Settings;
pub use error::AppError;
pub use pipeline::{GesturePipeline, PipelineManager, PipelineResult};
