//! Logging-based reporter.

use std::time::Duration;

use tracing::{info, warn};

use super::{HealthRecord, HealthReporter};
use crate::error::Error;
use crate::health::HealthStatus;
use crate::introspect::MemoryUsage;

const MIB: f64 = 1024.0 * 1024.0;

/// Publishes health records to the tracing subscriber.
///
/// Concise mode logs rounded percentages; verbose mode adds peak, threshold
/// and the time until the next check.
#[derive(Debug, Clone, Default)]
pub struct LoggingReporter {
    verbose: bool,
    interval: Option<Duration>,
}

impl LoggingReporter {
    pub fn concise() -> Self {
        Self::default()
    }

    pub fn verbose(interval: Duration) -> Self {
        Self {
            verbose: true,
            interval: Some(interval),
        }
    }
}

impl HealthReporter for LoggingReporter {
    fn report(&self, record: &HealthRecord) {
        let taken_at = record.taken_at.to_rfc3339();

        if self.verbose {
            let next_check_ms = self.interval.map(|i| i.as_millis() as u64).unwrap_or(0);
            match record.status {
                HealthStatus::Healthy => info!(
                    tick = record.tick,
                    taken_at = %taken_at,
                    cpu = record.cpu_percent,
                    memory = record.memory_percent,
                    disk = record.disk_percent,
                    peak = record.peak_percent,
                    threshold = record.threshold_percent,
                    next_check_ms,
                    status = %record.status,
                    "CPU {:.2}% | MEM {:.2}% | DISK {:.2}% - system healthy",
                    record.cpu_percent,
                    record.memory_percent,
                    record.disk_percent
                ),
                HealthStatus::Warning => warn!(
                    tick = record.tick,
                    taken_at = %taken_at,
                    cpu = record.cpu_percent,
                    memory = record.memory_percent,
                    disk = record.disk_percent,
                    peak = record.peak_percent,
                    threshold = record.threshold_percent,
                    next_check_ms,
                    status = %record.status,
                    "CPU {:.2}% | MEM {:.2}% | DISK {:.2}% - high resource usage",
                    record.cpu_percent,
                    record.memory_percent,
                    record.disk_percent
                ),
            }
            return;
        }

        match record.status {
            HealthStatus::Healthy => info!(
                tick = record.tick,
                taken_at = %taken_at,
                cpu = record.cpu_percent,
                memory = record.memory_percent,
                disk = record.disk_percent,
                status = %record.status,
                "CPU: {:.0}% | MEM: {:.0}% | DISK: {:.0}%",
                record.cpu_percent,
                record.memory_percent,
                record.disk_percent
            ),
            HealthStatus::Warning => warn!(
                tick = record.tick,
                taken_at = %taken_at,
                cpu = record.cpu_percent,
                memory = record.memory_percent,
                disk = record.disk_percent,
                status = %record.status,
                "CPU: {:.0}% | MEM: {:.0}% | DISK: {:.0}% - high resource usage",
                record.cpu_percent,
                record.memory_percent,
                record.disk_percent
            ),
        }
    }

    fn report_failure(&self, tick: u64, error: &Error) {
        warn!(tick, error = %error, "Health check skipped: sample failed");
    }

    fn report_memory(&self, usage: &MemoryUsage) {
        info!(
            resident_bytes = usage.resident_bytes,
            virtual_bytes = usage.virtual_bytes,
            "Memory usage: RSS {:.2} MB, virtual {:.2} MB",
            usage.resident_bytes as f64 / MIB,
            usage.virtual_bytes as f64 / MIB
        );
    }
}
