use bytes::Bytes;
use serde::Serialize;

/// Where the image of a request comes from. Resolved once per request.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Raw bytes from the multipart `image` field.
    Upload(Bytes),
    /// Remote image referenced by `image_url`.
    Url(String),
}

impl ImageSource {
    /// Tag echoed in the response stats. Uploads are reported as `null`.
    pub fn tag(&self) -> Option<SourceTag> {
        match self {
            ImageSource::Upload(_) => None,
            ImageSource::Url(_) => Some(SourceTag::Url),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Url,
}
