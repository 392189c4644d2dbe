//! Health record reporting
//!
//! Every completed health cycle produces one [`HealthRecord`], handed to a
//! [`HealthReporter`]. Failed samples and memory readings go through the
//! same port so every sink sees the full picture.
//!
//! # Reporters
//!
//! - [`LoggingReporter`] - structured `tracing` output (the default sink)
//! - [`MetricsReporter`] - Prometheus gauges and counters
//! - [`InMemoryReporter`] - collects records for tests
//! - [`CompositeReporter`] - fans out to several reporters

mod logging;
mod memory;

pub use logging::LoggingReporter;
pub use memory::InMemoryReporter;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Error;
use crate::health::HealthStatus;
use crate::introspect::MemoryUsage;
use crate::sampler::MetricsSnapshot;

pub use crate::metrics::MetricsReporter;

// =============================================================================
// Health Record
// =============================================================================

/// One emitted health-check result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRecord {
    /// Sequence number of the health cycle, starting at 1
    pub tick: u64,
    pub taken_at: DateTime<Utc>,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub peak_percent: f64,
    pub threshold_percent: f64,
    pub status: HealthStatus,
}

impl HealthRecord {
    pub fn new(
        tick: u64,
        snapshot: &MetricsSnapshot,
        threshold_percent: f64,
        status: HealthStatus,
    ) -> Self {
        Self {
            tick,
            taken_at: snapshot.taken_at(),
            cpu_percent: snapshot.cpu_percent(),
            memory_percent: snapshot.memory_percent(),
            disk_percent: snapshot.disk_percent(),
            peak_percent: snapshot.peak_percent(),
            threshold_percent,
            status,
        }
    }
}

// =============================================================================
// Reporter Port
// =============================================================================

/// Sink for monitor output.
///
/// Calls happen on the task that produced the value, one at a time per task.
pub trait HealthReporter: Send + Sync {
    /// A health cycle completed.
    fn report(&self, record: &HealthRecord);

    /// A health cycle was skipped because sampling failed.
    fn report_failure(&self, tick: u64, error: &Error);

    /// The memory introspection task took a reading.
    fn report_memory(&self, _usage: &MemoryUsage) {}
}

/// Reporter that forwards to several reporters in order.
#[derive(Default)]
pub struct CompositeReporter {
    reporters: Vec<Arc<dyn HealthReporter>>,
}

impl CompositeReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reporter.
    pub fn with(mut self, reporter: Arc<dyn HealthReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl HealthReporter for CompositeReporter {
    fn report(&self, record: &HealthRecord) {
        for reporter in &self.reporters {
            reporter.report(record);
        }
    }

    fn report_failure(&self, tick: u64, error: &Error) {
        for reporter in &self.reporters {
            reporter.report_failure(tick, error);
        }
    }

    fn report_memory(&self, usage: &MemoryUsage) {
        for reporter in &self.reporters {
            reporter.report_memory(usage);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
