use crate::config::UnavailablePolicy;
use crate::error::AppError;
use crate::pipeline::types::{DetectionStatus, HandResult, OverlayPoint, PipelineResult};
use serde::Serialize;
use serde_json::{Value, json};

/// Status code plus JSON body, ready for whatever HTTP layer sits in front.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: Value,
}

#[derive(Debug, Serialize)]
struct GestureBody<'a> {
    status: &'static str,
    gesture: Option<&'a str>,
    confidence: f32,
    landmarks: &'a [OverlayPoint],
    hands: &'a [HandResult],
    detection_status: DetectionStatus,
}

impl ApiResponse {
    pub fn success(result: &PipelineResult) -> Self {
        let body = GestureBody {
            status: "success",
            gesture: result.primary_gesture.as_ref().map(|g| g.as_str()),
            confidence: result.primary_confidence,
            landmarks: &result.landmarks,
            hands: &result.hands,
            detection_status: result.status,
        };
        Self {
            status_code: 200,
            body: serde_json::to_value(body).unwrap_or(Value::Null),
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            body: json!({ "status": "error", "message": message.into() }),
        }
    }

    /// Unavailable models answer with a null gesture either way; the policy picks the code.
    pub fn unavailable(result: &PipelineResult, policy: UnavailablePolicy) -> Self {
        match policy {
            UnavailablePolicy::Degraded => Self::success(result),
            UnavailablePolicy::Error => Self {
                status_code: 500,
                body: json!({
                    "status": "error",
                    "message": "Gesture recognition models are unavailable",
                    "gesture": Value::Null,
                    "confidence": 0.0,
                    "landmarks": [],
                }),
            },
        }
    }

    pub fn from_error(error: &AppError) -> Self {
        match error {
            AppError::Decode(e) => Self::error(400, e.to_string()),
            other => Self::error(500, other.to_string()),
        }
    }

    pub fn from_outcome(outcome: Result<PipelineResult, AppError>, policy: UnavailablePolicy) -> Self {
        match outcome {
            Ok(result) if result.is_unavailable() => Self::unavailable(&result, policy),
            Ok(result) => Self::success(&result),
            Err(e) => Self::from_error(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::pipeline::types::GestureLabel;

    #[test]
    fn success_body_matches_the_wire_shape() {
        let result = PipelineResult::from_hands(
            vec![HandResult {
                hand_index: 1,
                gesture: GestureLabel::new("A"),
                confidence: 0.5,
                raw_confidence: 0.5,
                class_index: 9,
            }],
            vec![OverlayPoint { x: 0.25, y: 0.75 }],
        );

        let response = ApiResponse::success(&result);
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body["status"], "success");
        assert_eq!(response.body["gesture"], "A");
        assert_eq!(response.body["confidence"], 0.5);
        assert_eq!(response.body["landmarks"], json!([{ "x": 0.25, "y": 0.75 }]));
        assert_eq!(response.body["detection_status"], "detected");
    }

    #[test]
    fn no_hands_is_a_null_gesture() {
        let response = ApiResponse::success(&PipelineResult::no_hands());
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body["gesture"], Value::Null);
        assert_eq!(response.body["confidence"], 0.0);
        assert_eq!(response.body["landmarks"], json!([]));
    }

    #[test]
    fn unavailable_mapping_follows_policy() {
        let result = PipelineResult::detector_unavailable();

        let degraded = ApiResponse::from_outcome(Ok(result.clone()), UnavailablePolicy::Degraded);
        assert_eq!(degraded.status_code, 200);
        assert_eq!(degraded.body["gesture"], Value::Null);
        assert_eq!(degraded.body["detection_status"], "detector_unavailable");

        let strict = ApiResponse::from_outcome(Ok(result), UnavailablePolicy::Error);
        assert_eq!(strict.status_code, 500);
        assert_eq!(strict.body["gesture"], Value::Null);
        assert_eq!(strict.body["confidence"], 0.0);
    }

    #[test]
    fn decode_errors_are_client_errors() {
        let response = ApiResponse::from_outcome(
            Err(AppError::Decode(DecodeError::EmptyPayload)),
            UnavailablePolicy::Error,
        );
        assert_eq!(response.status_code, 400);
        assert_eq!(response.body["message"], "No frame data provided");

        let worker = ApiResponse::from_error(&AppError::Worker("join failed".to_string()));
        assert_eq!(worker.status_code, 500);
    }
}
