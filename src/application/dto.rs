use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    detection::ModelOutput,
    source::SourceTag,
    stats::{average_confidence, round3, Speed},
};

/// JSON body accepted by `POST /detect` when no file is uploaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectUrlRequest {
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRecord {
    /// `[x, y, width, height]` in pixels of the normalized image.
    pub bbox: [f64; 4],
    pub confidence: f64,
    #[serde(rename = "class")]
    pub class_id: usize,
    pub image_width: u32,
    pub image_height: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectionStats {
    pub timestamp: DateTime<Utc>,
    pub image_source: Option<SourceTag>,
    pub image_dimensions: ImageDimensions,
    pub detection_count: usize,
    pub speed: Speed,
    pub total_processing_time: f64,
    pub average_confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectResponse {
    pub detections: Vec<DetectionRecord>,
    pub stats: DetectionStats,
}

impl DetectResponse {
    /// Shapes the model output into the public schema. Detection order is kept as-is.
    pub fn from_model_output(
        output: ModelOutput,
        dims: ImageDimensions,
        image_source: Option<SourceTag>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let detections: Vec<DetectionRecord> = output
            .detections
            .iter()
            .map(|d| {
                DetectionRecord {
                    bbox: d.to_xywh(),
                    confidence: round3(d.score as f64),
                    class_id: d.class_id,
                    image_width: dims.width,
                    image_height: dims.height,
                }
            })
            .collect();

        let confidences: Vec<f64> = detections.iter().map(|d| d.confidence).collect();

        let stats = DetectionStats {
            timestamp,
            image_source,
            image_dimensions: dims,
            detection_count: detections.len(),
            speed: output.speed,
            total_processing_time: output.speed.total(),
            average_confidence: average_confidence(&confidences),
        };

        Self { detections, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::detection::Detection;

    fn output(dets: Vec<Detection>) -> ModelOutput {
        ModelOutput {
            detections: dets,
            speed: Speed { preprocess: 2.0, inference: 20.0, postprocess: 1.0 },
        }
    }

    fn dims() -> ImageDimensions {
        ImageDimensions { width: 640, height: 480 }
    }

    #[test]
    fn empty_output_has_zero_count_and_average() {
        let resp = DetectResponse::from_model_output(output(vec![]), dims(), None, Utc::now());
        assert!(resp.detections.is_empty());
        assert_eq!(resp.stats.detection_count, 0);
        assert_eq!(resp.stats.average_confidence, 0.0);
        assert_eq!(resp.stats.total_processing_time, 23.0);
    }

    #[test]
    fn records_are_reshaped_and_rounded() {
        let dets = vec![
            Detection { x1: 10.0, y1: 20.0, x2: 60.0, y2: 100.0, score: 0.91234, class_id: 3 },
            Detection { x1: 0.0, y1: 0.0, x2: 5.0, y2: 5.0, score: 0.5004, class_id: 0 },
        ];
        let resp = DetectResponse::from_model_output(output(dets), dims(), Some(SourceTag::Url), Utc::now());

        assert_eq!(resp.stats.detection_count, resp.detections.len());
        assert_eq!(resp.detections[0].bbox, [10.0, 20.0, 50.0, 80.0]);
        assert_eq!(resp.detections[0].confidence, 0.912);
        assert_eq!(resp.detections[0].class_id, 3);
        assert_eq!(resp.detections[1].confidence, 0.5);
        assert_eq!(resp.stats.average_confidence, 0.706);
    }

    #[test]
    fn bbox_size_keeps_f64_precision() {
        let dets = vec![Detection { x1: 100.1, y1: 0.7, x2: 200.3, y2: 1.9, score: 0.8, class_id: 0 }];
        let resp = DetectResponse::from_model_output(output(dets), dims(), None, Utc::now());

        let bbox = resp.detections[0].bbox;
        assert_eq!(bbox[2], 200.3f32 as f64 - 100.1f32 as f64);
        assert_eq!(bbox[3], 1.9f32 as f64 - 0.7f32 as f64);
    }

    #[test]
    fn serializes_public_field_names() {
        let dets = vec![Detection { x1: 1.0, y1: 2.0, x2: 3.0, y2: 4.0, score: 0.8, class_id: 7 }];
        let resp = DetectResponse::from_model_output(output(dets), dims(), Some(SourceTag::Url), Utc::now());
        let v = serde_json::to_value(&resp).unwrap();

        let det = &v["detections"][0];
        assert_eq!(det["class"], 7);
        assert_eq!(det["imageWidth"], 640);
        assert_eq!(det["imageHeight"], 480);
        assert_eq!(det["bbox"].as_array().unwrap().len(), 4);

        let stats = &v["stats"];
        assert_eq!(stats["image_source"], "url");
        assert_eq!(stats["image_dimensions"]["width"], 640);
        assert_eq!(stats["detection_count"], 1);
        assert!(stats["speed"]["inference"].is_number());
        assert!(stats["timestamp"].is_string());
    }

    #[test]
    fn upload_source_serializes_as_null() {
        let resp = DetectResponse::from_model_output(output(vec![]), dims(), None, Utc::now());
        let v = serde_json::to_value(&resp).unwrap();
        assert!(v["stats"]["image_source"].is_null());
    }
}
