use serde::{Deserialize, Serialize};

use super::stats::Speed;

/// Raw detection as produced by the model, in corner form and original-image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
}

impl Detection {
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Origin + size form: `[x, y, width, height]`. Corners are widened to f64
    /// before subtracting.
    pub fn to_xywh(&self) -> [f64; 4] {
        let (x1, y1) = (self.x1 as f64, self.y1 as f64);
        let (x2, y2) = (self.x2 as f64, self.y2 as f64);
        [x1, y1, (x2 - x1).max(0.0), (y2 - y1).max(0.0)]
    }

    /// Clamp the box to `[0, w] x [0, h]`.
    pub fn clipped(mut self, w: u32, h: u32) -> Self {
        let (w, h) = (w as f32, h as f32);
        self.x1 = self.x1.clamp(0.0, w);
        self.y1 = self.y1.clamp(0.0, h);
        self.x2 = self.x2.clamp(0.0, w);
        self.y2 = self.y2.clamp(0.0, h);
        self
    }

    pub fn iou(&self, other: &Detection) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

/// Everything one model invocation reports back.
#[derive(Debug, Clone, Default)]
pub struct ModelOutput {
    pub detections: Vec<Detection>,
    pub speed: Speed,
}
