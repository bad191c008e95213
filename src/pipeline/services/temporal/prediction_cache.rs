use crate::pipeline::types::{ClassificationResult, FeatureVector};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Remembers the last classification, keyed by the feature vector rounded to 3 decimals.
pub struct PredictionCache {
    enabled: AtomicBool,
    last: Mutex<Option<(u64, ClassificationResult)>>,
}

impl PredictionCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            last: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<(u64, ClassificationResult)>> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn key(features: &FeatureVector) -> u64 {
        let mut hasher = DefaultHasher::new();
        for value in features.as_slice() {
            // -0.0 and 0.0 round to the same key
            let rounded = (value * 1000.0).round() as i64;
            rounded.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Return the cached result for `features`, or compute and store it.
    pub fn get_or_insert_with<E>(
        &self,
        features: &FeatureVector,
        compute: impl FnOnce() -> Result<ClassificationResult, E>,
    ) -> Result<ClassificationResult, E> {
        if !self.is_enabled() {
            return compute();
        }

        let key = Self::key(features);
        if let Some((cached_key, result)) = self.lock().as_ref() {
            if *cached_key == key {
                return Ok(result.clone());
            }
        }

        let result = compute()?;
        *self.lock() = Some((key, result.clone()));
        Ok(result)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Flip caching and return the new state. Disabling drops the cached entry.
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::AcqRel);
        if !enabled {
            self.clear();
        }
        enabled
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }
}

impl Default for PredictionCache {
    fn default() -> Self {
        Self::new(false)
    }
}
