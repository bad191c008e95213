use crate::pipeline::types::SessionId;
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

/// Per-request state that travels with one frame through the pipeline
#[derive(Debug, Clone)]
pub struct FrameContext {
    pub frame_id: Uuid,
    pub session: SessionId,
    pub hands_detected: usize,
    pub gestures_classified: usize,
    pub metrics: FrameMetrics,
    pub processing_start: Instant,
}

impl FrameContext {
    pub fn new(session: SessionId) -> Self {
        Self {
            frame_id: Uuid::nil(),
            session,
            hands_detected: 0,
            gestures_classified: 0,
            metrics: FrameMetrics::new(),
            processing_start: Instant::now(),
        }
    }

    /// Run `f` and record its duration under `step`
    pub fn timed<T>(&mut self, step: ProcessingStepType, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.metrics
            .record_duration(step, start.elapsed().as_micros() as u64);
        out
    }

    pub fn finalize(&mut self) {
        self.metrics.finalize(self.processing_start);
    }
}

/// Stage timings of one frame, in microseconds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameMetrics {
    pub decode_duration_us: u64,
    pub reduce_duration_us: u64,
    pub detect_duration_us: u64,
    /// Extraction, classification and smoothing of every hand combined
    pub classify_duration_us: u64,
    pub total_processing_duration_us: u64,
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_duration(&mut self, step: ProcessingStepType, duration_us: u64) {
        match step {
            ProcessingStepType::Decode => self.decode_duration_us = duration_us,
            ProcessingStepType::Reduce => self.reduce_duration_us = duration_us,
            ProcessingStepType::Detect => self.detect_duration_us = duration_us,
            ProcessingStepType::Classify => self.classify_duration_us = duration_us,
        }
    }

    pub fn duration(&self, step: ProcessingStepType) -> u64 {
        match step {
            ProcessingStepType::Decode => self.decode_duration_us,
            ProcessingStepType::Reduce => self.reduce_duration_us,
            ProcessingStepType::Detect => self.detect_duration_us,
            ProcessingStepType::Classify => self.classify_duration_us,
        }
    }

    pub fn finalize(&mut self, start_time: Instant) {
        self.total_processing_duration_us = start_time.elapsed().as_micros() as u64;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProcessingStepType {
    Decode,
    Reduce,
    Detect,
    Classify,
}

impl ProcessingStepType {
    pub const ALL: [ProcessingStepType; 4] = [
        ProcessingStepType::Decode,
        ProcessingStepType::Reduce,
        ProcessingStepType::Detect,
        ProcessingStepType::Classify,
    ];
}
