use crate::common::EncodedFrame;
use crate::error::DecodeError;
use crate::pipeline::types::SessionId;
use serde::Deserialize;

/// Inbound frame request. `frame` carries plain base64, `image` a data URI;
/// either is accepted and `frame` wins when both are present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessFrameRequest {
    #[serde(default)]
    pub frame: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ProcessFrameRequest {
    pub fn from_frame(frame: impl Into<String>) -> Self {
        Self {
            frame: Some(frame.into()),
            ..Self::default()
        }
    }

    pub fn from_image(image: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
            ..Self::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn payload(&self) -> Option<&str> {
        [self.frame.as_deref(), self.image.as_deref()]
            .into_iter()
            .flatten()
            .find(|p| !p.trim().is_empty())
    }

    pub fn into_encoded(self) -> Result<EncodedFrame, DecodeError> {
        let payload = self
            .payload()
            .map(str::to_owned)
            .ok_or(DecodeError::EmptyPayload)?;
        Ok(EncodedFrame::new(SessionId::from(self.session_id), payload))
    }
}
