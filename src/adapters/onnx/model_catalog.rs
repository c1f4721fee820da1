use async_trait::async_trait;
use std::path::Path;

use crate::application::ports::ModelCatalogPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::ModelId;

pub struct OnnxModelCatalog;

impl OnnxModelCatalog {
    pub fn new() -> Self { Self }
}

impl Default for OnnxModelCatalog {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl ModelCatalogPort for OnnxModelCatalog {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()> {
        if model.onnx_path.trim().is_empty() {
            return Err(DomainError::InvalidInput("onnx_path empty".into()));
        }
        let path = Path::new(&model.onnx_path);
        if !path.exists() {
            return Err(DomainError::NotFound(format!("model file not found: {}", model.onnx_path)));
        }
        if !path.is_file() {
            return Err(DomainError::InvalidInput(format!("not a file: {}", model.onnx_path)));
        }
        let is_onnx = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("onnx"))
            .unwrap_or(false);
        if !is_onnx {
            return Err(DomainError::InvalidInput(format!("expected a .onnx file: {}", model.onnx_path)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_empty_path() {
        let err = OnnxModelCatalog::new()
            .validate_model(&ModelId::from_path(""))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn rejects_missing_file() {
        let err = OnnxModelCatalog::new()
            .validate_model(&ModelId::from_path("/definitely/not/here/model.onnx"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn rejects_wrong_extension() {
        let path = std::env::temp_dir().join(format!("yolo-detect-api-{}.txt", std::process::id()));
        std::fs::write(&path, b"not a model").unwrap();

        let err = OnnxModelCatalog::new()
            .validate_model(&ModelId::from_path(path.to_string_lossy()))
            .await
            .unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn accepts_existing_onnx_file() {
        let path = std::env::temp_dir().join(format!("yolo-detect-api-{}.onnx", std::process::id()));
        std::fs::write(&path, b"stub").unwrap();

        let result = OnnxModelCatalog::new()
            .validate_model(&ModelId::from_path(path.to_string_lossy()))
            .await;
        let _ = std::fs::remove_file(&path);
        assert!(result.is_ok());
    }
}
