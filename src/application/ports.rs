use async_trait::async_trait;
use bytes::Bytes;
use image::RgbImage;

use crate::domain::{
    detection::ModelOutput,
    errors::DomainResult,
    model::ModelId,
};

#[async_trait]
pub trait ImageFetcherPort: Send + Sync {
    async fn fetch(&self, url: &str) -> DomainResult<Bytes>;
}

/// Decodes raw bytes and normalizes them (orientation + RGB) for the detector.
pub trait ImageNormalizerPort: Send + Sync {
    fn normalize(&self, bytes: &[u8]) -> DomainResult<RgbImage>;
}

/// Blocking call into the loaded model. Runs on the blocking pool.
pub trait DetectorPort: Send + Sync {
    fn detect(&self, image: &RgbImage) -> DomainResult<ModelOutput>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}
