use std::path::PathBuf;
use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Decode Error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Worker failed: {0}")]
    Worker(String),
}

// Frame payload errors, always surfaced to the caller as a 4xx.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("No frame data provided")]
    EmptyPayload,
    #[error("Frame data too small: {len} bytes (minimum {min})")]
    PayloadTooSmall { len: usize, min: usize },
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("Unsupported or corrupt image: {0}")]
    UnsupportedFormat(#[from] image::ImageError),
    #[error("Decoded image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

// Model loading errors. Recorded once per process and never retried.
#[derive(Error, Debug, Clone)]
pub enum ModelError {
    #[error("Model artifact not found: {0}")]
    MissingArtifact(PathBuf),
    #[error("Failed to load model from {path}: {reason}")]
    Load { path: PathBuf, reason: String },
    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),
    #[error("No loader strategy succeeded ({attempts} attempted)")]
    Exhausted { attempts: usize },
    #[error("Landmark detector is not available: {0}")]
    DetectorUnavailable(String),
    #[error("Model loader panicked: {0}")]
    LoaderPanicked(String),
    #[error("Model initialization failed earlier: {0}")]
    PreviouslyFailed(String),
}

// Per-hand failures. These never fail a request, the hand is skipped instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("Feature length mismatch: expected {expected}, got {actual}")]
    FeatureLengthMismatch { expected: usize, actual: usize },
    #[error("Classifier fault: {0}")]
    ClassifierFault(String),
    #[error("Landmark detection failed: {0}")]
    Detection(String),
}
