use super::request::ProcessFrameRequest;
use super::response::ApiResponse;
use crate::config::{ServerSettings, UnavailablePolicy};
use crate::error::AppError;
use crate::pipeline::PipelineManager;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::util::BoxCloneService;
use tower::{BoxError, Service, ServiceBuilder};
use tracing::debug;

/// Request boundary: runs each frame on the blocking pool and maps the outcome
/// to a status code and JSON body.
#[derive(Clone)]
pub struct GestureService {
    manager: PipelineManager,
    policy: UnavailablePolicy,
}

impl GestureService {
    pub fn new(manager: PipelineManager, policy: UnavailablePolicy) -> Self {
        Self { manager, policy }
    }

    /// Wrap with the request timeout and in-flight limit from `server`
    pub fn layered(
        self,
        server: &ServerSettings,
    ) -> BoxCloneService<ProcessFrameRequest, ApiResponse, BoxError> {
        let service = ServiceBuilder::new()
            .timeout(Duration::from_millis(server.request_timeout_ms))
            .concurrency_limit(server.max_in_flight.max(1))
            .service(self);
        BoxCloneService::new(service)
    }
}

impl Service<ProcessFrameRequest> for GestureService {
    type Response = ApiResponse;
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: ProcessFrameRequest) -> Self::Future {
        let manager = self.manager.clone();
        let policy = self.policy;

        Box::pin(async move {
            let frame = match request.into_encoded() {
                Ok(frame) => frame,
                Err(e) => {
                    debug!("Rejecting request: {}", e);
                    return Ok(ApiResponse::from_error(&AppError::Decode(e)));
                }
            };

            let outcome = tokio::task::spawn_blocking(move || manager.process(&frame))
                .await
                .map_err(|e| AppError::Worker(e.to_string()))?;

            Ok(ApiResponse::from_outcome(outcome, policy))
        })
    }
}
