use std::sync::Arc;
use crate::application::services::DetectionService;

/// Shared state for the Axum HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Detection use case (detector loaded once, read-only).
    pub detection: Arc<DetectionService>,
    /// Request body limit for multipart uploads.
    pub max_upload_bytes: usize,
}
