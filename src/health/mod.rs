//! Threshold evaluation
//!
//! Classifies a [`MetricsSnapshot`] against the alert threshold. A snapshot
//! whose peak usage equals the threshold is still healthy; only a peak
//! strictly above it is a warning.

#[cfg(test)]
mod proptest;

use serde::{Deserialize, Serialize};

use crate::sampler::MetricsSnapshot;

/// Health status derived from a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Peak usage at or below the threshold
    Healthy,
    /// Peak usage above the threshold
    Warning,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        *self == HealthStatus::Healthy
    }

    /// Label used for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "HEALTHY"),
            HealthStatus::Warning => write!(f, "WARNING"),
        }
    }
}

/// Classify a snapshot against `threshold_percent`.
pub fn classify(snapshot: &MetricsSnapshot, threshold_percent: f64) -> HealthStatus {
    if snapshot.peak_percent() > threshold_percent {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    }
}

/// Evaluator bound to the configured threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdEvaluator {
    threshold_percent: f64,
}

impl ThresholdEvaluator {
    pub fn new(threshold_percent: f64) -> Self {
        Self { threshold_percent }
    }

    pub fn threshold_percent(&self) -> f64 {
        self.threshold_percent
    }

    pub fn classify(&self, snapshot: &MetricsSnapshot) -> HealthStatus {
        classify(snapshot, self.threshold_percent)
    }
}

// =============================================================================
// Tests
// =============================================================================
