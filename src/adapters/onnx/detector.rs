use anyhow::Result;
use image::RgbImage;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{error, info};

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::DetectorPort;
use crate::domain::{
    detection::ModelOutput,
    errors::{DomainError, DomainResult},
    model::{ModelId, YoloParams},
};

/// YOLO model adapter, loaded once at startup.
/// `Session::run` needs `&mut`, so requests are serialized through a Mutex.
pub struct OnnxDetector {
    model: ModelId,
    engine: Mutex<OnnxYoloEngine>,
}

impl OnnxDetector {
    pub fn load(model: ModelId, params: YoloParams, intra_threads: usize) -> Result<Self> {
        let t_load = Instant::now();
        let mut engine = OnnxYoloEngine::load(&model.onnx_path, params, intra_threads)?;
        info!(
            "🧠 Model '{}' loaded in {:.0} ms",
            model.name,
            t_load.elapsed().as_secs_f64() * 1000.0
        );

        let t_warm = Instant::now();
        engine.warmup()?;
        info!(
            "🔥 Warmup finished in {:.0} ms (imgsz={})",
            t_warm.elapsed().as_secs_f64() * 1000.0,
            engine.params().input_size
        );

        Ok(Self {
            model,
            engine: Mutex::new(engine),
        })
    }

    pub fn model(&self) -> &ModelId {
        &self.model
    }
}

impl DetectorPort for OnnxDetector {
    fn detect(&self, image: &RgbImage) -> DomainResult<ModelOutput> {
        let mut engine = self
            .engine
            .lock()
            .map_err(|_| DomainError::Inference("model lock poisoned".into()))?;

        engine.infer(image).map_err(|e| {
            error!("❌ YOLO inference failed ({}): {:?}", self.model.name, e);
            DomainError::Inference(e.to_string())
        })
    }
}
