pub mod landmark_detector;
#[cfg(feature = "onnx")]
pub mod letterbox;
#[cfg(feature = "onnx")]
pub mod onnx_landmarker;
#[cfg(feature = "onnx")]
pub mod palm_detector;

pub use landmark_detector::LandmarkDetector;
#[cfg(feature = "onnx")]
pub use onnx_landmarker::OrtHandLandmarker;
#[cfg(feature = "onnx")]
pub use palm_detector::{OrtPalmDetector, PalmRegion};
