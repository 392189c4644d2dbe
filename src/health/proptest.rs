//! Property-Based Tests for Threshold Classification
//!
//! # Test Properties
//!
//! 1. **Inclusive Boundary**: peak == threshold is always Healthy
//! 2. **Strict Excess**: peak > threshold is always Warning
//! 3. **Determinism**: the same snapshot and threshold classify the same way

#![cfg(test)]

use chrono::Utc;
use proptest::prelude::*;

use super::{classify, HealthStatus};
use crate::sampler::{MetricsSnapshot, Reading};

// =============================================================================
// Property Strategies
// =============================================================================

fn percent() -> impl Strategy<Value = f64> {
    0.0f64..=100.0
}

/// Index of the metric that carries the peak, plus two fractions of it.
fn peak_layout() -> impl Strategy<Value = (usize, f64, f64)> {
    (0usize..3, 0.0f64..=1.0, 0.0f64..=1.0)
}

fn snapshot_with_peak(peak: f64, slot: usize, a: f64, b: f64) -> MetricsSnapshot {
    let (a, b) = (a * peak, b * peak);
    let reading = match slot {
        0 => Reading::new(peak, a, b),
        1 => Reading::new(a, peak, b),
        _ => Reading::new(a, b, peak),
    };
    MetricsSnapshot::new("proptest", reading, Utc::now()).unwrap()
}

// =============================================================================
// Boundary Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_peak_equal_to_threshold_is_healthy(
        threshold in percent(),
        (slot, a, b) in peak_layout(),
    ) {
        let snapshot = snapshot_with_peak(threshold, slot, a, b);
        prop_assert_eq!(classify(&snapshot, threshold), HealthStatus::Healthy);
    }

    #[test]
    fn prop_peak_above_threshold_is_warning(
        threshold in 0.0f64..100.0,
        epsilon in 1e-9f64..=100.0,
        slot in 0usize..3,
    ) {
        let peak = (threshold + epsilon).min(100.0);
        prop_assume!(peak > threshold);

        let snapshot = snapshot_with_peak(peak, slot, 0.0, threshold / peak);
        prop_assert_eq!(classify(&snapshot, threshold), HealthStatus::Warning);
    }

    #[test]
    fn prop_classify_matches_max(
        cpu in percent(),
        memory in percent(),
        disk in percent(),
        threshold in percent(),
    ) {
        let snapshot = MetricsSnapshot::new("proptest", Reading::new(cpu, memory, disk), Utc::now()).unwrap();
        let expected = if cpu.max(memory).max(disk) > threshold {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };

        prop_assert_eq!(classify(&snapshot, threshold), expected);
        prop_assert_eq!(classify(&snapshot, threshold), classify(&snapshot, threshold));
    }
}
