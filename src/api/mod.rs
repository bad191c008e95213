pub mod request;
pub mod response;
pub mod service;

pub use request::ProcessFrameRequest;
pub use response::ApiResponse;
pub use service::GestureService;
