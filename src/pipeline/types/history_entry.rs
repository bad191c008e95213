use super::{GestureLabel, SessionId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One classification event kept in the gesture history
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub gesture: GestureLabel,
    pub confidence: f32,
    /// 1-based position of the hand in detector order
    pub hand_index: usize,
    pub timestamp: DateTime<Utc>,
    pub session: SessionId,
    pub frame_id: Uuid,
}

impl HistoryEntry {
    /// Display form used by the history view, e.g. `A (Hand 1)`
    pub fn display_label(&self) -> String {
        format!("{} (Hand {})", self.gesture, self.hand_index)
    }
}

/// Builder for creating history entries
pub struct HistoryEntryBuilder {
    gesture: GestureLabel,
    confidence: f32,
    hand_index: usize,
    session: SessionId,
    frame_id: Uuid,
    timestamp: Option<DateTime<Utc>>,
}

impl HistoryEntryBuilder {
    pub fn new(gesture: GestureLabel, confidence: f32, hand_index: usize) -> Self {
        Self {
            gesture,
            confidence,
            hand_index,
            session: SessionId::global(),
            frame_id: Uuid::nil(),
            timestamp: None,
        }
    }

    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = session;
        self
    }

    pub fn with_frame_id(mut self, frame_id: Uuid) -> Self {
        self.frame_id = frame_id;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn build(self) -> HistoryEntry {
        HistoryEntry {
            gesture: self.gesture,
            confidence: self.confidence,
            hand_index: self.hand_index,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            session: self.session,
            frame_id: self.frame_id,
        }
    }
}
