use super::metrics::{DebugInfo, PerformanceStats};
use super::model_state::ModelState;
use super::pipeline_orchestrator::GesturePipeline;
use crate::common::EncodedFrame;
use crate::error::{AppError, ModelError};
use crate::pipeline::types::{HistoryEntry, PipelineResult, SessionId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// History entry as shown to callers
#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub gesture: String,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
    pub session: SessionId,
}

impl From<&HistoryEntry> for HistoryView {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            gesture: entry.display_label(),
            confidence: entry.confidence,
            timestamp: entry.timestamp,
            session: entry.session.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub history: Vec<HistoryView>,
    pub total_entries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationStatus {
    pub smoothing_enabled: bool,
    pub detection_caching: bool,
    pub smoothing_window: usize,
    pub scale_factor: f32,
    pub max_hands: usize,
    pub active_sessions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub state: ModelState,
    pub detector: Option<&'static str>,
    pub classifier: Option<&'static str>,
    pub classifier_source: Option<PathBuf>,
    pub labels: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub performance: PerformanceStats,
    pub debug: DebugInfo,
}

/// Cloneable handle over a shared pipeline, exposing its management operations.
#[derive(Clone)]
pub struct PipelineManager {
    pipeline: Arc<GesturePipeline>,
}

impl PipelineManager {
    pub fn new(pipeline: GesturePipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn pipeline(&self) -> &Arc<GesturePipeline> {
        &self.pipeline
    }

    pub fn process(&self, frame: &EncodedFrame) -> Result<PipelineResult, AppError> {
        self.pipeline.process(frame)
    }

    pub fn warm_up(&self) -> Result<(), ModelError> {
        info!("Warming up gesture models");
        self.pipeline.warm_up()
    }

    /// Last `n` history entries, oldest first
    pub fn recent_history(&self, n: usize) -> Vec<HistoryView> {
        self.pipeline
            .history()
            .recent(n)
            .iter()
            .map(HistoryView::from)
            .collect()
    }

    pub fn recent_history_for(&self, session: &SessionId, n: usize) -> Vec<HistoryView> {
        self.pipeline
            .history()
            .recent_for(session, n)
            .iter()
            .map(HistoryView::from)
            .collect()
    }

    /// The default history page plus the number of retained entries
    pub fn history_page(&self) -> HistoryPage {
        HistoryPage {
            history: self.recent_history(self.pipeline.config().history_page),
            total_entries: self.history_total(),
        }
    }

    pub fn history_total(&self) -> usize {
        self.pipeline.history().len()
    }

    pub fn clear_history(&self) {
        self.pipeline.history().clear();
        info!("Gesture history cleared");
    }

    /// Returns the new smoothing state
    pub fn toggle_smoothing(&self) -> bool {
        let enabled = self.pipeline.smoother().toggle();
        info!("Confidence smoothing {}", on_off(enabled));
        enabled
    }

    pub fn set_smoothing(&self, enabled: bool) {
        self.pipeline.smoother().set_enabled(enabled);
        info!("Confidence smoothing {}", on_off(enabled));
    }

    /// Returns the new caching state
    pub fn toggle_detection_caching(&self) -> bool {
        let enabled = self.pipeline.prediction_cache().toggle();
        info!("Detection caching {}", on_off(enabled));
        enabled
    }

    pub fn optimization_status(&self) -> OptimizationStatus {
        let smoother = self.pipeline.smoother();
        let config = self.pipeline.config();
        OptimizationStatus {
            smoothing_enabled: smoother.is_enabled(),
            detection_caching: self.pipeline.prediction_cache().is_enabled(),
            smoothing_window: smoother.window_size(),
            scale_factor: config.scale_factor,
            max_hands: config.max_hands,
            active_sessions: smoother.session_count(),
        }
    }

    pub fn model_status(&self) -> ModelStatus {
        let models = self.pipeline.models();
        let loaded = models.loaded();
        ModelStatus {
            state: models.state(),
            detector: loaded.map(|m| m.detector.name()),
            classifier: loaded.map(|m| m.classifier.name()),
            classifier_source: loaded.map(|m| m.classifier_source.clone()),
            labels: loaded
                .map(|m| m.labels.labels().to_vec())
                .unwrap_or_default(),
            error: models.failure().map(ToString::to_string),
        }
    }

    pub fn performance_stats(&self) -> PerformanceReport {
        PerformanceReport {
            performance: self.pipeline.performance().get_stats(),
            debug: self.pipeline.debug_tracker().get_debug_info(),
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfiguration;
    use crate::pipeline::services::classification::LoadedModels;
    use crate::test_support::{FakeDetector, MarkerClassifier, encode_png, hand, loaded_models};

    fn manager(config: PipelineConfiguration) -> PipelineManager {
        PipelineManager::new(GesturePipeline::new(
            config,
            || -> Result<LoadedModels, ModelError> {
                Ok(loaded_models(
                    FakeDetector::with_hands(vec![hand(0.1)]),
                    MarkerClassifier::new(vec![(0.1, 9, 0.8)]),
                ))
            },
        ))
    }

    #[test]
    fn history_page_reports_total_and_latest_entries() {
        let config = PipelineConfiguration {
            history_page: 3,
            ..PipelineConfiguration::default()
        };
        let manager = manager(config);
        for _ in 0..5 {
            manager
                .process(&EncodedFrame::global(encode_png(32, 32)))
                .unwrap();
        }

        let page = manager.history_page();
        assert_eq!(page.total_entries, 5);
        assert_eq!(page.history.len(), 3);
        assert_eq!(page.history[0].gesture, "A (Hand 1)");

        manager.clear_history();
        assert_eq!(manager.history_total(), 0);
        assert!(manager.recent_history(10).is_empty());
    }

    #[test]
    fn toggles_are_reflected_in_optimization_status() {
        let manager = manager(PipelineConfiguration::default());
        let status = manager.optimization_status();
        assert!(!status.smoothing_enabled);
        assert!(!status.detection_caching);
        assert_eq!(status.smoothing_window, 5);

        assert!(manager.toggle_smoothing());
        assert!(manager.toggle_detection_caching());
        let status = manager.optimization_status();
        assert!(status.smoothing_enabled);
        assert!(status.detection_caching);

        manager.set_smoothing(false);
        assert!(!manager.optimization_status().smoothing_enabled);
    }

    #[test]
    fn model_status_follows_initialization() {
        let manager = manager(PipelineConfiguration::default());
        let before = manager.model_status();
        assert_eq!(before.state, ModelState::Uninitialized);
        assert!(before.labels.is_empty());

        manager.warm_up().unwrap();
        let after = manager.model_status();
        assert_eq!(after.state, ModelState::Ready);
        assert_eq!(after.detector, Some("fake-detector"));
        assert_eq!(after.labels.len(), 36);
        assert!(after.error.is_none());
    }

    #[test]
    fn clones_share_the_same_pipeline() {
        let manager = manager(PipelineConfiguration::default());
        let other = manager.clone();
        other
            .process(&EncodedFrame::global(encode_png(32, 32)))
            .unwrap();
        assert_eq!(manager.history_total(), 1);
        assert_eq!(manager.performance_stats().performance.total_frames_processed, 1);
    }
}
