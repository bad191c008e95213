pub mod frame_context;
pub mod management;
pub mod metrics;
pub mod model_state;
pub mod pipeline_orchestrator;

pub use frame_context::{FrameContext, FrameMetrics, ProcessingStepType};
pub use management::{
    HistoryPage, HistoryView, ModelStatus, OptimizationStatus, PerformanceReport, PipelineManager,
};
pub use metrics::{
    DebugInfo, DebugTracker, MetricsCollector, MetricsObserver, PerformanceMonitor,
    PerformanceStats,
};
pub use model_state::{LazyModels, ModelState};
pub use pipeline_orchestrator::GesturePipeline;
