use crate::common::DecodedFrame;
use crate::error::DecodeError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

const DATA_URI_SCHEME: &str = "data:";

/// Decodes base64 (optionally data-URI wrapped) image payloads into RGB pixel buffers.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    min_payload_len: usize,
}

impl FrameCodec {
    pub fn new(min_payload_len: usize) -> Self {
        Self { min_payload_len }
    }

    pub fn min_payload_len(&self) -> usize {
        self.min_payload_len
    }

    /// Decode a payload. Undersized payloads are rejected before any base64 work.
    pub fn decode(&self, payload: &str) -> Result<DecodedFrame, DecodeError> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(DecodeError::EmptyPayload);
        }
        if payload.len() < self.min_payload_len {
            return Err(DecodeError::PayloadTooSmall {
                len: payload.len(),
                min: self.min_payload_len,
            });
        }

        let bytes = STANDARD.decode(strip_data_uri(payload))?;
        if bytes.is_empty() {
            return Err(DecodeError::EmptyPayload);
        }

        let image = image::load_from_memory(&bytes)?.to_rgb8();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::EmptyImage { width, height });
        }

        debug!(
            "Decoded frame: {} payload bytes -> {}x{}",
            payload.len(),
            width,
            height
        );
        Ok(DecodedFrame::new(image))
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(50)
    }
}

/// `data:image/jpeg;base64,AAAA` -> `AAAA`. Plain base64 passes through untouched.
fn strip_data_uri(payload: &str) -> &str {
    if payload.starts_with(DATA_URI_SCHEME) {
        if let Some((_, body)) = payload.split_once(',') {
            return body;
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encode_png, encode_png_data_uri};

    #[test]
    fn decodes_plain_base64_png() {
        let codec = FrameCodec::default();
        let frame = codec.decode(&encode_png(32, 24)).unwrap();
        assert_eq!(frame.dimensions(), (32, 24));
    }

    #[test]
    fn decodes_data_uri_payloads() {
        let codec = FrameCodec::default();
        let frame = codec.decode(&encode_png_data_uri(20, 10)).unwrap();
        assert_eq!(frame.dimensions(), (20, 10));
    }

    #[test]
    fn rejects_empty_and_undersized_payloads() {
        let codec = FrameCodec::default();
        assert!(matches!(codec.decode(""), Err(DecodeError::EmptyPayload)));
        assert!(matches!(codec.decode("   "), Err(DecodeError::EmptyPayload)));
        assert!(matches!(
            codec.decode("aGVsbG8="),
            Err(DecodeError::PayloadTooSmall { len: 8, min: 50 })
        ));
    }

    #[test]
    fn rejects_malformed_base64() {
        let codec = FrameCodec::default();
        let payload = "!!not base64!!".repeat(8);
        assert!(matches!(
            codec.decode(&payload),
            Err(DecodeError::InvalidBase64(_))
        ));
    }

    #[test]
    fn rejects_bytes_that_are_not_an_image() {
        let codec = FrameCodec::default();
        let payload = STANDARD.encode(vec![7u8; 120]);
        assert!(matches!(
            codec.decode(&payload),
            Err(DecodeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn strip_data_uri_leaves_plain_payloads_alone() {
        assert_eq!(strip_data_uri("data:image/png;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_uri("QUJD"), "QUJD");
    }
}
