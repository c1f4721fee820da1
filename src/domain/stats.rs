use serde::{Deserialize, Serialize};

/// Per-stage timings reported by one model invocation, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Speed {
    pub preprocess: f64,
    pub inference: f64,
    pub postprocess: f64,
}

impl Speed {
    pub fn total(&self) -> f64 {
        self.preprocess + self.inference + self.postprocess
    }
}

/// Rounds to 3 decimal places.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Mean of the given confidences rounded to 3 decimals, or 0 when empty.
pub fn average_confidence(confidences: &[f64]) -> f64 {
    if confidences.is_empty() {
        return 0.0;
    }
    round3(confidences.iter().sum::<f64>() / confidences.len() as f64)
}
