use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::warn;

use crate::application::ports::ImageFetcherPort;
use crate::domain::errors::{DomainError, DomainResult};

/// Shared HTTP client for downloading remote images.
/// A browser User-Agent gets past basic hot-link protection (Imgur, for one).
pub struct ReqwestImageFetcher {
    client: reqwest::Client,
}

impl ReqwestImageFetcher {
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self { client: builder.build()? })
    }
}

#[async_trait]
impl ImageFetcherPort for ReqwestImageFetcher {
    async fn fetch(&self, url: &str) -> DomainResult<Bytes> {
        let fail = |e: reqwest::Error| {
            warn!("⚠️ Image fetch failed for {}: {}", url, e);
            DomainError::FetchFailed(e.to_string())
        };

        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(fail)?
            .error_for_status()
            .map_err(fail)?;

        res.bytes().await.map_err(fail)
    }
}
