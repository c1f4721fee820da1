use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::YoloParams;

/// Process configuration: command-line flags with environment variable fallbacks.
#[derive(Debug, Clone, Parser)]
#[command(name = "yolo-detect-api", version, about = "HTTP object detection over a YOLO ONNX model")]
pub struct AppConfig {
    /// Path to the exported YOLO `.onnx` model
    #[arg(long = "model", env = "DETECT_MODEL_PATH", default_value = "weights/model.onnx")]
    pub model_path: String,

    /// Address the HTTP server listens on
    #[arg(long, env = "DETECT_BIND", default_value = "0.0.0.0:8090")]
    pub bind: SocketAddr,

    /// Square model input size in pixels
    #[arg(long, env = "DETECT_IMGSZ", default_value_t = 640)]
    pub imgsz: u32,

    /// Minimum class score to keep a candidate
    #[arg(long, env = "DETECT_CONF", default_value_t = 0.25)]
    pub conf: f32,

    /// IoU above which same-class boxes are suppressed
    #[arg(long, env = "DETECT_IOU", default_value_t = 0.7)]
    pub iou: f32,

    /// Maximum detections returned per image
    #[arg(long, env = "DETECT_MAX_DET", default_value_t = 300)]
    pub max_det: usize,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "DETECT_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    /// User-Agent sent when fetching `image_url`
    #[arg(long, env = "DETECT_USER_AGENT", default_value = "Mozilla/5.0")]
    pub user_agent: String,

    /// Timeout for `image_url` fetches; unset means no timeout
    #[arg(long, env = "DETECT_FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: Option<u64>,

    /// Maximum request body size in bytes
    #[arg(long, env = "DETECT_MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn validate(&self) -> DomainResult<()> {
        if self.imgsz == 0 {
            return Err(DomainError::InvalidInput("imgsz must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.conf) {
            return Err(DomainError::InvalidInput(format!("conf must be within 0..=1, got {}", self.conf)));
        }
        if !(0.0..=1.0).contains(&self.iou) {
            return Err(DomainError::InvalidInput(format!("iou must be within 0..=1, got {}", self.iou)));
        }
        if self.max_det == 0 {
            return Err(DomainError::InvalidInput("max_det must be > 0".into()));
        }
        if self.intra_threads == 0 {
            return Err(DomainError::InvalidInput("intra_threads must be > 0".into()));
        }
        Ok(())
    }

    pub fn yolo_params(&self) -> YoloParams {
        YoloParams {
            input_size: self.imgsz,
            conf_threshold: self.conf,
            iou_threshold: self.iou,
            max_detections: self.max_det,
        }
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        let mut argv = vec!["yolo-detect-api"];
        argv.extend_from_slice(args);
        AppConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = parse(&[
            "--model", "weights/simple_model_2.onnx",
            "--bind", "127.0.0.1:5000",
            "--conf", "0.4",
            "--max-det", "10",
            "--fetch-timeout-secs", "30",
        ]);
        assert_eq!(cfg.model_path, "weights/simple_model_2.onnx");
        assert_eq!(cfg.bind.port(), 5000);
        assert_eq!(cfg.yolo_params().conf_threshold, 0.4);
        assert_eq!(cfg.yolo_params().max_detections, 10);
        assert_eq!(cfg.fetch_timeout(), Some(Duration::from_secs(30)));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn out_of_range_thresholds_are_rejected() {
        assert!(parse(&["--conf", "1.5"]).validate().is_err());
        assert!(parse(&["--iou=-0.1"]).validate().is_err());
        assert!(parse(&["--imgsz", "0"]).validate().is_err());
        assert!(parse(&["--max-det", "0"]).validate().is_err());
    }
}
