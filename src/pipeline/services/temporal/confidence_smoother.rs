use crate::pipeline::types::SessionId;
use indexmap::IndexMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Temporal filter over raw classifier confidences, one window per session.
///
/// With `n` samples in the window the weights are `exp(linspace(-1, 0, n))`
/// normalized to sum to one, so the newest sample weighs the most. When disabled
/// `smooth` returns its input and never touches a window.
pub struct ConfidenceSmoother {
    enabled: AtomicBool,
    window_size: usize,
    max_sessions: usize,
    windows: Mutex<IndexMap<SessionId, VecDeque<f32>>>,
}

impl ConfidenceSmoother {
    pub fn new(enabled: bool, window_size: usize, max_sessions: usize) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            window_size: window_size.max(1),
            max_sessions: max_sessions.max(1),
            windows: Mutex::new(IndexMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<SessionId, VecDeque<f32>>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn smooth(&self, session: &SessionId, raw: f32) -> f32 {
        if !self.is_enabled() {
            return raw;
        }

        let mut windows = self.lock();
        // Front is the least recently used session
        match windows.get_index_of(session) {
            Some(index) => {
                let last = windows.len() - 1;
                windows.move_index(index, last);
            }
            None => {
                if windows.len() >= self.max_sessions {
                    if let Some((evicted, _)) = windows.shift_remove_index(0) {
                        debug!("Evicting smoothing window for session {}", evicted);
                    }
                }
                windows.insert(session.clone(), VecDeque::with_capacity(self.window_size));
            }
        }

        let Some((_, window)) = windows.last_mut() else {
            return raw;
        };
        window.push_back(raw);
        while window.len() > self.window_size {
            window.pop_front();
        }

        Self::weighted_average(window).unwrap_or(raw)
    }

    fn weighted_average(window: &VecDeque<f32>) -> Option<f32> {
        let n = window.len();
        if n == 0 {
            return None;
        }

        let weights: Vec<f32> = (0..n)
            .map(|i| {
                let t = if n == 1 {
                    0.0
                } else {
                    -1.0 + i as f32 / (n - 1) as f32
                };
                t.exp()
            })
            .collect();
        let total: f32 = weights.iter().sum();

        Some(
            window
                .iter()
                .zip(&weights)
                .map(|(c, w)| c * w / total)
                .sum(),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Flip the toggle and return the new state
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    pub fn reset(&self, session: &SessionId) {
        self.lock().shift_remove(session);
    }
}

impl Default for ConfidenceSmoother {
    fn default() -> Self {
        Self::new(false, DEFAULT_SMOOTHING_WINDOW, 256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str) -> SessionId {
        SessionId::new(id)
    }

    #[test]
    fn disabled_is_identity() {
        let smoother = ConfidenceSmoother::default();
        for c in [0.0, 0.1, 0.5, 0.92, 1.0] {
            assert_eq!(smoother.smooth(&session("s"), c), c);
        }
        assert_eq!(smoother.session_count(), 0);
    }

    #[test]
    fn constant_stream_converges() {
        let smoother = ConfidenceSmoother::new(true, 5, 16);
        let mut last = 0.0;
        for _ in 0..8 {
            last = smoother.smooth(&session("s"), 0.7);
        }
        assert!((last - 0.7).abs() < 1e-5);
    }

    #[test]
    fn first_sample_is_returned_unchanged() {
        let smoother = ConfidenceSmoother::new(true, 5, 16);
        assert!((smoother.smooth(&session("s"), 0.42) - 0.42).abs() < 1e-6);
    }

    #[test]
    fn newest_sample_weighs_most() {
        let smoother = ConfidenceSmoother::new(true, 5, 16);
        smoother.smooth(&session("s"), 0.0);
        let smoothed = smoother.smooth(&session("s"), 1.0);
        // weights e^-1 and e^0, normalized
        let expected = 1.0 / (1.0 + (-1.0f32).exp());
        assert!((smoothed - expected).abs() < 1e-5);
        assert!(smoothed > 0.5);
    }

    #[test]
    fn sessions_do_not_share_windows() {
        let smoother = ConfidenceSmoother::new(true, 5, 16);
        for _ in 0..5 {
            smoother.smooth(&session("a"), 0.1);
        }
        let b = smoother.smooth(&session("b"), 0.9);
        assert!((b - 0.9).abs() < 1e-6);
        assert_eq!(smoother.session_count(), 2);
    }

    #[test]
    fn active_session_survives_eviction() {
        let smoother = ConfidenceSmoother::new(true, 5, 2);
        smoother.smooth(&session("a"), 0.1);
        smoother.smooth(&session("b"), 0.2);
        smoother.smooth(&session("a"), 0.1);
        // "b" is now the least recently used
        smoother.smooth(&session("c"), 0.3);
        assert_eq!(smoother.session_count(), 2);

        // "a" keeps its window, so a new sample is pulled toward 0.1
        assert!(smoother.smooth(&session("a"), 0.9) < 0.9);
        // "b" starts over
        assert!((smoother.smooth(&session("b"), 0.6) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn least_recent_session_is_evicted_at_capacity() {
        let smoother = ConfidenceSmoother::new(true, 5, 2);
        smoother.smooth(&session("a"), 0.1);
        smoother.smooth(&session("b"), 0.2);
        smoother.smooth(&session("c"), 0.3);
        assert_eq!(smoother.session_count(), 2);

        // "a" starts over with a fresh window
        assert!((smoother.smooth(&session("a"), 0.8) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn toggle_reports_the_new_state() {
        let smoother = ConfidenceSmoother::default();
        assert!(smoother.toggle());
        assert!(smoother.is_enabled());
        assert!(!smoother.toggle());
        assert!(!smoother.is_enabled());
    }
}
