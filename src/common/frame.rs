use crate::pipeline::types::SessionId;
use chrono::{DateTime, Utc};
use image::RgbImage;
use std::sync::Arc;
use uuid::Uuid;

/// A frame as it arrives from a caller: an encoded image string plus who sent it.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub session: SessionId,
    pub payload: String,
    pub received_at: DateTime<Utc>,
}

impl EncodedFrame {
    pub fn new(session: SessionId, payload: impl Into<String>) -> Self {
        Self {
            session,
            payload: payload.into(),
            received_at: Utc::now(),
        }
    }

    /// Frame for the shared process-wide session
    pub fn global(payload: impl Into<String>) -> Self {
        Self::new(SessionId::global(), payload)
    }
}

/// Decoded RGB pixel buffer. Lives only for the duration of one request.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    frame_id: Uuid,
    image: Arc<RgbImage>,
    decoded_at: DateTime<Utc>,
}

impl DecodedFrame {
    pub fn new(image: RgbImage) -> Self {
        Self {
            frame_id: Uuid::new_v4(),
            image: Arc::new(image),
            decoded_at: Utc::now(),
        }
    }

    pub fn frame_id(&self) -> Uuid {
        self.frame_id
    }

    pub fn image(&self) -> &Arc<RgbImage> {
        &self.image
    }

    pub fn decoded_at(&self) -> DateTime<Utc> {
        self.decoded_at
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
