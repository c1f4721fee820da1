use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::{
    application::{
        dto::{DetectResponse, ImageDimensions},
        ports::{DetectorPort, ImageFetcherPort, ImageNormalizerPort},
    },
    domain::{
        errors::{DomainError, DomainResult},
        source::ImageSource,
    },
};

/// Main use case: acquire the image, normalize it, run the detector and shape the response.
/// The detector is created once at startup and shared read-only.
#[derive(Clone)]
pub struct DetectionService {
    fetcher: Arc<dyn ImageFetcherPort>,
    normalizer: Arc<dyn ImageNormalizerPort>,
    detector: Arc<dyn DetectorPort>,
}

impl DetectionService {
    pub fn new(
        fetcher: Arc<dyn ImageFetcherPort>,
        normalizer: Arc<dyn ImageNormalizerPort>,
        detector: Arc<dyn DetectorPort>,
    ) -> Self {
        Self {
            fetcher,
            normalizer,
            detector,
        }
    }

    pub async fn detect(&self, source: ImageSource) -> DomainResult<DetectResponse> {
        let timestamp = Utc::now();
        let tag = source.tag();

        let bytes = match source {
            ImageSource::Upload(bytes) => bytes,
            ImageSource::Url(url) => {
                debug!("Fetching remote image: {}", url);
                self.fetcher.fetch(&url).await?
            }
        };

        // Decode and inference block, so they run off the Tokio reactor.
        let normalizer = self.normalizer.clone();
        let detector = self.detector.clone();
        let (dims, output) = tokio::task::spawn_blocking(move || -> DomainResult<_> {
            let image = normalizer.normalize(&bytes)?;
            let dims = ImageDimensions {
                width: image.width(),
                height: image.height(),
            };
            let output = detector.detect(&image)?;
            Ok((dims, output))
        })
        .await
        .map_err(|e| DomainError::Inference(format!("worker task failed: {e}")))??;

        info!(
            "🎯 {} detections on {}x{} in {:.1} ms",
            output.detections.len(),
            dims.width,
            dims.height,
            output.speed.total()
        );

        Ok(DetectResponse::from_model_output(output, dims, tag, timestamp))
    }
}
