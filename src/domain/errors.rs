use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No image file or URL provided")]
    MissingInput,
    #[error("Failed to fetch image from URL: {0}")]
    FetchFailed(String),
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
