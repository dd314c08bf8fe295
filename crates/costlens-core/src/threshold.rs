//! Cost ceiling evaluation

use serde::{Deserialize, Serialize};

/// Daily ceiling used when none is configured
pub const DEFAULT_DAILY_THRESHOLD: f64 = 5.0;

/// Outcome of comparing a total against a ceiling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEvaluation {
    pub exceeded: bool,
    pub total: f64,
    pub threshold: f64,
}

impl ThresholdEvaluation {
    /// Amount above the ceiling, 0 when within it
    pub fn overage(&self) -> f64 {
        (self.total - self.threshold).max(0.0)
    }
}

/// `exceeded` is true only when `total` is strictly above `threshold`
pub fn evaluate_threshold(total: f64, threshold: f64) -> ThresholdEvaluation {
    ThresholdEvaluation {
        exceeded: total > threshold,
        total,
        threshold,
    }
}
