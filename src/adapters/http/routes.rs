use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use bytes::Bytes;
use tracing::debug;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::state::HttpState;
use crate::application::dto::{DetectResponse, DetectUrlRequest};
use crate::domain::{errors::DomainError, source::ImageSource};

/// POST /detect
///
/// Accepts a multipart `image` file or JSON `{"image_url": "..."}`, in that order.
pub async fn detect(
    State(st): State<HttpState>,
    req: Request,
) -> Result<Json<DetectResponse>, ApiError> {
    let source = resolve_source(req, &st).await?;
    let response = st.detection.detect(source).await?;
    Ok(Json(response))
}

async fn resolve_source(req: Request, st: &HttpState) -> Result<ImageSource, ApiError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(req, st)
            .await
            .map_err(|e| ApiError::new(e.status(), format!("Invalid multipart body: {}", e.body_text())))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::new(e.status(), format!("Invalid multipart body: {}", e.body_text())))?
        {
            // Only a file part counts; a plain form value named `image` is ignored.
            if field.name() == Some("image") && field.file_name().is_some() {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::new(e.status(), format!("Invalid multipart body: {}", e.body_text())))?;
                debug!("Uploaded image: {} bytes", data.len());
                return Ok(ImageSource::Upload(data));
            }
        }
        return Err(DomainError::MissingInput.into());
    }

    if content_type.starts_with("application/json") {
        let body = Bytes::from_request(req, st)
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;

        if let Ok(DetectUrlRequest { image_url: Some(url) }) = serde_json::from_slice(&body) {
            return Ok(ImageSource::Url(url));
        }
    }

    Err(DomainError::MissingInput.into())
}
