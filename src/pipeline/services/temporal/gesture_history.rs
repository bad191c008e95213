use crate::pipeline::types::{HistoryEntry, SessionId};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Bounded FIFO log of recent classifications, shared by every session.
pub struct GestureHistory {
    entries: Mutex<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl GestureHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<HistoryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, entry: HistoryEntry) {
        let mut entries = self.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// The last `min(n, len)` entries, oldest first
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        let entries = self.lock();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    /// Like `recent`, restricted to one session
    pub fn recent_for(&self, session: &SessionId, n: usize) -> Vec<HistoryEntry> {
        let entries = self.lock();
        let mut matching: Vec<HistoryEntry> = entries
            .iter()
            .rev()
            .filter(|e| &e.session == session)
            .take(n)
            .cloned()
            .collect();
        matching.reverse();
        matching
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for GestureHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
