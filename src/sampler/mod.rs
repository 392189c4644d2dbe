//! Sampler - "The Eyes"
//!
//! Produces [`MetricsSnapshot`]s through a pluggable [`Collector`]. The
//! sampler owns the timeout and range checks so collectors stay simple.
//!
//! # Collectors
//!
//! ```text
//! ┌────────────────────┐  ┌────────────────────┐  ┌────────────────────┐
//! │ SimulatedCollector │  │  SystemCollector   │  │  FixtureCollector  │
//! │ (random, default)  │  │  (sysinfo)         │  │  (scripted, tests) │
//! └─────────┬──────────┘  └─────────┬──────────┘  └─────────┬──────────┘
//!           └───────────────────────┼───────────────────────┘
//!                                   ▼
//!                          Sampler (timeout + validation)
//! ```

mod fixture;
mod simulated;
mod system;

pub use fixture::{FixtureCollector, FixtureStep};
pub use simulated::SimulatedCollector;
pub use system::SystemCollector;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// Default upper bound on a single collection
pub const DEFAULT_COLLECTOR_TIMEOUT: Duration = Duration::from_secs(2);

// =============================================================================
// Readings and Snapshots
// =============================================================================

/// Raw utilisation values as reported by a collector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
}

impl Reading {
    pub fn new(cpu_percent: f64, memory_percent: f64, disk_percent: f64) -> Self {
        Self {
            cpu_percent,
            memory_percent,
            disk_percent,
        }
    }
}

/// One immutable observation of host utilisation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    cpu_percent: f64,
    memory_percent: f64,
    disk_percent: f64,
    taken_at: DateTime<Utc>,
}

impl MetricsSnapshot {
    /// Build a snapshot, rejecting values that are not finite or not in 0-100.
    pub fn new(
        collector: &'static str,
        reading: Reading,
        taken_at: DateTime<Utc>,
    ) -> Result<Self> {
        let checked = |metric: &'static str, value: f64| {
            if value.is_finite() && (0.0..=100.0).contains(&value) {
                Ok(value)
            } else {
                Err(Error::InvalidSample {
                    collector,
                    metric,
                    value,
                })
            }
        };

        Ok(Self {
            cpu_percent: checked("cpu", reading.cpu_percent)?,
            memory_percent: checked("memory", reading.memory_percent)?,
            disk_percent: checked("disk", reading.disk_percent)?,
            taken_at,
        })
    }

    pub fn cpu_percent(&self) -> f64 {
        self.cpu_percent
    }

    pub fn memory_percent(&self) -> f64 {
        self.memory_percent
    }

    pub fn disk_percent(&self) -> f64 {
        self.disk_percent
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Highest of the three utilisation values
    pub fn peak_percent(&self) -> f64 {
        self.cpu_percent
            .max(self.memory_percent)
            .max(self.disk_percent)
    }
}

// =============================================================================
// Collector Port
// =============================================================================

/// Source of raw utilisation values.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Take one reading.
    async fn collect(&self) -> Result<Reading>;
}

// =============================================================================
// Sampler
// =============================================================================

/// Bounded, validated access to a collector
#[derive(Clone)]
pub struct Sampler {
    collector: Arc<dyn Collector>,
    timeout: Duration,
}

impl Sampler {
    pub fn new(collector: Arc<dyn Collector>) -> Self {
        Self::with_timeout(collector, DEFAULT_COLLECTOR_TIMEOUT)
    }

    pub fn with_timeout(collector: Arc<dyn Collector>, timeout: Duration) -> Self {
        Self { collector, timeout }
    }

    /// Take one snapshot.
    ///
    /// Timeouts, collector errors and out-of-range values all surface as
    /// sample failures (see [`Error::is_sample_failure`]).
    #[instrument(skip(self), fields(collector = self.collector.name()))]
    pub async fn sample(&self) -> Result<MetricsSnapshot> {
        let name = self.collector.name();

        let reading = tokio::time::timeout(self.timeout, self.collector.collect())
            .await
            .map_err(|_| Error::SampleTimeout {
                collector: name,
                timeout: self.timeout,
            })?
            .map_err(|e| match e {
                e if e.is_sample_failure() => e,
                other => Error::Collector {
                    collector: name,
                    reason: other.to_string(),
                },
            })?;

        let snapshot = MetricsSnapshot::new(name, reading, Utc::now())?;
        debug!(
            cpu = snapshot.cpu_percent,
            memory = snapshot.memory_percent,
            disk = snapshot.disk_percent,
            "Sample taken"
        );
        Ok(snapshot)
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("collector", &self.collector.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
