use crate::error::ModelError;
use crate::pipeline::services::classification::{LoadedModels, ModelLoader};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;
use tracing::{error, info};

/// Lifecycle of the shared models. `Ready` and `Unavailable` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ModelState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
    Unavailable = 3,
}

impl From<u8> for ModelState {
    fn from(value: u8) -> Self {
        match value {
            1 => ModelState::Initializing,
            2 => ModelState::Ready,
            3 => ModelState::Unavailable,
            _ => ModelState::Uninitialized,
        }
    }
}

/// Loads the models on first use, exactly once.
///
/// Concurrent first callers block on the same initialization. The outcome,
/// success or failure, is kept for the lifetime of the value and never retried.
pub struct LazyModels {
    loader: Box<dyn ModelLoader>,
    state: AtomicU8,
    outcome: OnceLock<Result<LoadedModels, ModelError>>,
}

impl LazyModels {
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            state: AtomicU8::new(ModelState::Uninitialized as u8),
            outcome: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Result<&LoadedModels, ModelError> {
        let mut loaded_here = false;
        let outcome = self.outcome.get_or_init(|| {
            loaded_here = true;
            self.initialize()
        });

        match outcome {
            Ok(models) => Ok(models),
            Err(e) if loaded_here => Err(e.clone()),
            Err(e) => Err(ModelError::PreviouslyFailed(e.to_string())),
        }
    }

    fn initialize(&self) -> Result<LoadedModels, ModelError> {
        self.set_state(ModelState::Initializing);
        info!("Initializing gesture models");
        let started = Instant::now();

        // A panicking loader still ends in Unavailable, never back in Uninitialized
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.loader.load()))
            .unwrap_or_else(|payload| {
                Err(ModelError::LoaderPanicked(panic_message(&*payload)))
            });
        match &result {
            Ok(models) => {
                self.set_state(ModelState::Ready);
                info!(
                    "Models ready in {}ms: detector={}, classifier={} ({} labels)",
                    started.elapsed().as_millis(),
                    models.detector.name(),
                    models.classifier.name(),
                    models.labels.len()
                );
            }
            Err(e) => {
                self.set_state(ModelState::Unavailable);
                error!("Model initialization failed, pipeline unavailable: {}", e);
            }
        }
        result
    }

    fn set_state(&self, state: ModelState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn state(&self) -> ModelState {
        ModelState::from(self.state.load(Ordering::Acquire))
    }

    /// Loaded models, without triggering initialization
    pub fn loaded(&self) -> Option<&LoadedModels> {
        self.outcome.get().and_then(|outcome| outcome.as_ref().ok())
    }

    /// Recorded failure, if initialization ended in `Unavailable`
    pub fn failure(&self) -> Option<&ModelError> {
        self.outcome.get().and_then(|outcome| outcome.as_ref().err())
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
