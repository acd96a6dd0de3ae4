//! Threshold models

use serde::{Deserialize, Serialize};

use crate::logic::threshold::format_percent;

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdResponse {
    pub threshold: f64,
    pub threshold_percent: String,
}

impl ThresholdResponse {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            threshold_percent: format_percent(threshold),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateThreshold {
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdUpdated {
    pub threshold: f64,
    pub previous_threshold: f64,
    pub message: String,
}

impl ThresholdUpdated {
    pub fn new(threshold: f64, previous_threshold: f64) -> Self {
        Self {
            threshold,
            previous_threshold,
            message: format!("Threshold updated to {}", format_percent(threshold)),
        }
    }
}
