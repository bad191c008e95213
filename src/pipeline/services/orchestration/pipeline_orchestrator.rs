use super::frame_context::{FrameContext, ProcessingStepType};
use super::metrics::{DebugTracker, MetricsCollector, PerformanceMonitor};
use super::model_state::{LazyModels, panic_message};
use crate::common::EncodedFrame;
use crate::config::{ModelSettings, PipelineConfiguration};
use crate::error::{AppError, ModelError};
use crate::pipeline::services::classification::{
    ArtifactModelLoader, FeatureExtractor, LoadedModels, ModelLoader,
};
use crate::pipeline::services::preprocessing::{FrameCodec, ResolutionReducer};
use crate::pipeline::services::temporal::{ConfidenceSmoother, GestureHistory, PredictionCache};
use crate::pipeline::types::{
    ClassificationResult, FeatureVector, HandResult, HistoryEntryBuilder, PipelineResult,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Turns encoded frames into gesture results.
///
/// Models are loaded on the first `process` call (or `warm_up`), once. Temporal
/// state (smoothing windows, history, prediction cache) lives here and is safe to
/// share across threads.
pub struct GesturePipeline {
    config: PipelineConfiguration,
    codec: FrameCodec,
    reducer: ResolutionReducer,
    models: LazyModels,
    smoother: ConfidenceSmoother,
    history: GestureHistory,
    cache: PredictionCache,
    metrics_collector: Mutex<MetricsCollector>,
    performance: PerformanceMonitor,
    debug_tracker: DebugTracker,
}

impl GesturePipeline {
    pub fn new(config: PipelineConfiguration, loader: impl ModelLoader + 'static) -> Self {
        let performance = PerformanceMonitor::new();
        let debug_tracker = DebugTracker::new();
        let metrics_collector = MetricsCollector::new()
            .add_observer(Box::new(performance.clone()))
            .add_observer(Box::new(debug_tracker.clone()));

        info!(
            "Gesture pipeline configured: scale={}, max_hands={}, smoothing={} (window {}), caching={}",
            config.scale_factor,
            config.max_hands,
            config.smoothing_enabled,
            config.smoothing_window,
            config.detection_caching
        );

        Self {
            codec: FrameCodec::new(config.min_payload_len),
            reducer: ResolutionReducer::new(config.scale_factor),
            models: LazyModels::new(loader),
            smoother: ConfidenceSmoother::new(
                config.smoothing_enabled,
                config.smoothing_window,
                config.max_sessions,
            ),
            history: GestureHistory::new(config.history_capacity),
            cache: PredictionCache::new(config.detection_caching),
            metrics_collector: Mutex::new(metrics_collector),
            performance,
            debug_tracker,
            config,
        }
    }

    /// Pipeline backed by the artifacts named in `models`
    pub fn from_settings(config: PipelineConfiguration, models: ModelSettings) -> Self {
        let loader = ArtifactModelLoader::new(models, config.min_hand_confidence);
        Self::new(config, loader)
    }

    /// Load models now instead of on the first frame
    pub fn warm_up(&self) -> Result<(), ModelError> {
        self.models.get().map(|_| ())
    }

    /// Run one frame through decode, reduce, detect and per-hand classification.
    ///
    /// Payload problems are errors. An unavailable model, no hands and hands
    /// without a gesture are all normal results.
    #[instrument(skip(self, frame), fields(session = %frame.session))]
    pub fn process(&self, frame: &EncodedFrame) -> Result<PipelineResult, AppError> {
        let mut ctx = FrameContext::new(frame.session.clone());

        let models = match self.models.get() {
            Ok(models) => models,
            Err(e) => {
                debug!("Models unavailable, skipping frame: {}", e);
                return Ok(PipelineResult::detector_unavailable());
            }
        };

        let decoded = ctx.timed(ProcessingStepType::Decode, || {
            self.codec.decode(&frame.payload)
        })?;
        ctx.frame_id = decoded.frame_id();

        let reduced = ctx.timed(ProcessingStepType::Reduce, || {
            self.reducer.reduce(decoded.image())
        });

        let max_hands = self.config.max_hands;
        let detected = ctx.timed(ProcessingStepType::Detect, || {
            panic::catch_unwind(AssertUnwindSafe(|| {
                models.detector.detect(&reduced.image, max_hands)
            }))
        });
        let hands = match detected {
            Ok(Ok(hands)) => hands,
            Ok(Err(e)) => {
                warn!("Landmark detection failed, treating frame as empty: {}", e);
                Vec::new()
            }
            Err(payload) => {
                error!(
                    "Landmark detector panicked, treating frame as empty: {}",
                    panic_message(&*payload)
                );
                Vec::new()
            }
        };
        ctx.hands_detected = hands.len().min(max_hands);

        if hands.is_empty() {
            self.finish(&mut ctx);
            return Ok(PipelineResult::no_hands());
        }

        let classify_start = Instant::now();
        let mut hand_results = Vec::new();
        let mut overlay = Vec::new();

        for (i, landmarks) in hands.iter().take(max_hands).enumerate() {
            let hand_index = i + 1;
            let Some(features) = FeatureExtractor::extract(landmarks) else {
                debug!(
                    "Hand {} has {} landmarks, skipping",
                    hand_index,
                    landmarks.len()
                );
                continue;
            };
            overlay.extend(landmarks.overlay_points());

            let Some(classification) = self.classify(models, &features) else {
                continue;
            };
            let raw_confidence = classification.confidence();
            if raw_confidence <= 0.0 {
                debug!("Hand {} classified with zero confidence", hand_index);
                continue;
            }

            let gesture = models.labels.resolve(classification.class_index());
            let confidence = self.smoother.smooth(&ctx.session, raw_confidence);

            self.history.append(
                HistoryEntryBuilder::new(gesture.clone(), confidence, hand_index)
                    .with_session(ctx.session.clone())
                    .with_frame_id(ctx.frame_id)
                    .build(),
            );
            self.metrics().notify_gesture_detected(&ctx.session, &gesture);

            debug!(
                "Hand {}: {} ({:.2}, raw {:.2})",
                hand_index, gesture, confidence, raw_confidence
            );
            hand_results.push(HandResult {
                hand_index,
                gesture,
                confidence,
                raw_confidence,
                class_index: classification.class_index(),
            });
        }

        ctx.gestures_classified = hand_results.len();
        ctx.metrics.record_duration(
            ProcessingStepType::Classify,
            classify_start.elapsed().as_micros() as u64,
        );
        self.finish(&mut ctx);

        Ok(PipelineResult::from_hands(hand_results, overlay))
    }

    /// Classify one hand. Any classifier fault, including a panic, means no gesture.
    fn classify(
        &self,
        models: &LoadedModels,
        features: &FeatureVector,
    ) -> Option<ClassificationResult> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.cache
                .get_or_insert_with(features, || models.classifier.classify(features))
        }));

        match outcome {
            Ok(Ok(classification)) => Some(classification),
            Ok(Err(e)) => {
                warn!("Classifier fault, hand skipped: {}", e);
                None
            }
            Err(_) => {
                error!("Classifier panicked, hand skipped");
                None
            }
        }
    }

    fn finish(&self, ctx: &mut FrameContext) {
        ctx.finalize();
        debug!(
            "Frame {} done: hands={}, gestures={}, decode={}us reduce={}us detect={}us classify={}us total={}us",
            ctx.frame_id,
            ctx.hands_detected,
            ctx.gestures_classified,
            ctx.metrics.decode_duration_us,
            ctx.metrics.reduce_duration_us,
            ctx.metrics.detect_duration_us,
            ctx.metrics.classify_duration_us,
            ctx.metrics.total_processing_duration_us
        );
        self.metrics()
            .notify_frame_processed(&ctx.session, &ctx.metrics);
    }

    fn metrics(&self) -> std::sync::MutexGuard<'_, MetricsCollector> {
        self.metrics_collector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &PipelineConfiguration {
        &self.config
    }

    pub fn models(&self) -> &LazyModels {
        &self.models
    }

    pub fn smoother(&self) -> &ConfidenceSmoother {
        &self.smoother
    }

    pub fn history(&self) -> &GestureHistory {
        &self.history
    }

    pub fn prediction_cache(&self) -> &PredictionCache {
        &self.cache
    }

    pub fn performance(&self) -> &PerformanceMonitor {
        &self.performance
    }

    pub fn debug_tracker(&self) -> &DebugTracker {
        &self.debug_tracker
    }
}
