use super::frame_context::{FrameMetrics, ProcessingStepType};
use crate::pipeline::types::{GestureLabel, SessionId};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Observer pattern for metrics collection
pub trait MetricsObserver: Send + Sync {
    fn on_frame_processed(&mut self, session: &SessionId, metrics: &FrameMetrics);
    fn on_gesture_detected(&mut self, session: &SessionId, gesture: &GestureLabel);
    fn on_processing_step(&mut self, session: &SessionId, step: ProcessingStepType, duration_us: u64);
}

/// Collects and manages multiple metrics observers
#[derive(Default)]
pub struct MetricsCollector {
    observers: Vec<Box<dyn MetricsObserver>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(mut self, observer: Box<dyn MetricsObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn notify_frame_processed(&mut self, session: &SessionId, metrics: &FrameMetrics) {
        for observer in &mut self.observers {
            for step in ProcessingStepType::ALL {
                observer.on_processing_step(session, step, metrics.duration(step));
            }
            observer.on_frame_processed(session, metrics);
        }
    }

    pub fn notify_gesture_detected(&mut self, session: &SessionId, gesture: &GestureLabel) {
        for observer in &mut self.observers {
            observer.on_gesture_detected(session, gesture);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Performance monitoring observer
#[derive(Clone)]
pub struct PerformanceMonitor {
    stats: Arc<Mutex<PerformanceStats>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceStats {
    pub total_frames_processed: usize,
    pub total_gestures_detected: usize,
    pub average_frame_time_us: f32,
    pub frames_per_second: f32,
    #[serde(skip)]
    pub last_fps_calculation: Instant,
    #[serde(skip)]
    pub fps_frame_count: usize,

    // EWMA timing stats per step
    pub avg_decode_us: f32,
    pub avg_reduce_us: f32,
    pub avg_detect_us: f32,
    pub avg_classify_us: f32,

    // Max timing stats for bottleneck detection
    pub max_decode_us: u64,
    pub max_reduce_us: u64,
    pub max_detect_us: u64,
    pub max_classify_us: u64,
}

impl Default for PerformanceStats {
    fn default() -> Self {
        Self {
            total_frames_processed: 0,
            total_gestures_detected: 0,
            average_frame_time_us: 0.0,
            frames_per_second: 0.0,
            last_fps_calculation: Instant::now(),
            fps_frame_count: 0,
            avg_decode_us: 0.0,
            avg_reduce_us: 0.0,
            avg_detect_us: 0.0,
            avg_classify_us: 0.0,
            max_decode_us: 0,
            max_reduce_us: 0,
            max_detect_us: 0,
            max_classify_us: 0,
        }
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(Mutex::new(PerformanceStats::default())),
        }
    }

    pub fn get_stats(&self) -> PerformanceStats {
        lock(&self.stats).clone()
    }

    fn update_ewma(current: f32, new_value: u64, alpha: f32) -> f32 {
        current * (1.0 - alpha) + new_value as f32 * alpha
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsObserver for PerformanceMonitor {
    fn on_frame_processed(&mut self, _session: &SessionId, metrics: &FrameMetrics) {
        let mut stats = lock(&self.stats);
        stats.total_frames_processed += 1;
        tracing::debug!(
            "PerformanceMonitor: processed frame {}, total_time={}us",
            stats.total_frames_processed,
            metrics.total_processing_duration_us
        );

        const ALPHA: f32 = 0.1; // EWMA smoothing factor
        stats.average_frame_time_us = Self::update_ewma(
            stats.average_frame_time_us,
            metrics.total_processing_duration_us,
            ALPHA,
        );

        stats.fps_frame_count += 1;
        let now = Instant::now();
        let elapsed = now.duration_since(stats.last_fps_calculation);
        if elapsed.as_secs_f32() >= 1.0 {
            stats.frames_per_second = stats.fps_frame_count as f32 / elapsed.as_secs_f32();
            stats.fps_frame_count = 0;
            stats.last_fps_calculation = now;
        }
    }

    fn on_gesture_detected(&mut self, _session: &SessionId, _gesture: &GestureLabel) {
        lock(&self.stats).total_gestures_detected += 1;
    }

    fn on_processing_step(&mut self, _session: &SessionId, step: ProcessingStepType, duration_us: u64) {
        let mut guard = lock(&self.stats);
        let stats = &mut *guard;
        const ALPHA: f32 = 0.1;

        let (avg, max) = match step {
            ProcessingStepType::Decode => (&mut stats.avg_decode_us, &mut stats.max_decode_us),
            ProcessingStepType::Reduce => (&mut stats.avg_reduce_us, &mut stats.max_reduce_us),
            ProcessingStepType::Detect => (&mut stats.avg_detect_us, &mut stats.max_detect_us),
            ProcessingStepType::Classify => {
                (&mut stats.avg_classify_us, &mut stats.max_classify_us)
            }
        };
        *avg = Self::update_ewma(*avg, duration_us, ALPHA);
        *max = (*max).max(duration_us);
    }
}

/// Debug information tracker
#[derive(Clone)]
pub struct DebugTracker {
    debug_info: Arc<Mutex<DebugInfo>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DebugInfo {
    pub last_session: Option<SessionId>,
    pub last_gesture: Option<String>,
    pub recent_frame_times: Vec<u64>,
    pub bottleneck_warnings: Vec<String>,
}

impl DebugTracker {
    pub fn new() -> Self {
        Self {
            debug_info: Arc::new(Mutex::new(DebugInfo::default())),
        }
    }

    pub fn get_debug_info(&self) -> DebugInfo {
        lock(&self.debug_info).clone()
    }

    fn push_warning(debug: &mut DebugInfo, warning: String) {
        debug.bottleneck_warnings.push(warning);
        if debug.bottleneck_warnings.len() > 5 {
            debug.bottleneck_warnings.remove(0);
        }
    }
}

impl Default for DebugTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsObserver for DebugTracker {
    fn on_frame_processed(&mut self, session: &SessionId, metrics: &FrameMetrics) {
        let mut debug = lock(&self.debug_info);
        debug.last_session = Some(session.clone());

        debug
            .recent_frame_times
            .push(metrics.total_processing_duration_us);
        if debug.recent_frame_times.len() > 10 {
            debug.recent_frame_times.remove(0);
        }

        // Detect bottlenecks (> 50ms processing time)
        if metrics.total_processing_duration_us > 50_000 {
            let warning = format!(
                "Slow frame processing: {}us for session {}",
                metrics.total_processing_duration_us, session
            );
            Self::push_warning(&mut debug, warning);
        }
    }

    fn on_gesture_detected(&mut self, session: &SessionId, gesture: &GestureLabel) {
        lock(&self.debug_info).last_gesture = Some(format!("Session {}: {}", session, gesture));
    }

    fn on_processing_step(&mut self, _session: &SessionId, step: ProcessingStepType, duration_us: u64) {
        // Detect step-level bottlenecks (> 20ms per step)
        if duration_us > 20_000 {
            let warning = format!("Slow processing step {:?}: {}us", step, duration_us);
            Self::push_warning(&mut lock(&self.debug_info), warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(detect_us: u64, total_us: u64) -> FrameMetrics {
        FrameMetrics {
            detect_duration_us: detect_us,
            total_processing_duration_us: total_us,
            ..FrameMetrics::default()
        }
    }

    #[test]
    fn performance_monitor_tracks_ewma_and_max() {
        let monitor = PerformanceMonitor::new();
        let mut collector = MetricsCollector::new().add_observer(Box::new(monitor.clone()));
        let session = SessionId::global();

        collector.notify_frame_processed(&session, &metrics(1_000, 2_000));
        collector.notify_frame_processed(&session, &metrics(3_000, 4_000));
        collector.notify_gesture_detected(&session, &GestureLabel::new("A"));

        let stats = monitor.get_stats();
        assert_eq!(stats.total_frames_processed, 2);
        assert_eq!(stats.total_gestures_detected, 1);
        assert_eq!(stats.max_detect_us, 3_000);
        // 0 -> 100 -> 390
        assert!((stats.avg_detect_us - 390.0).abs() < 1e-3);
    }

    #[test]
    fn debug_tracker_flags_slow_frames() {
        let tracker = DebugTracker::new();
        let mut collector = MetricsCollector::new().add_observer(Box::new(tracker.clone()));
        let session = SessionId::new("cam-1");

        collector.notify_frame_processed(&session, &metrics(25_000, 60_000));

        let info = tracker.get_debug_info();
        assert_eq!(info.last_session, Some(session));
        assert_eq!(info.recent_frame_times, vec![60_000]);
        // one step warning, one frame warning
        assert_eq!(info.bottleneck_warnings.len(), 2);
    }
}
