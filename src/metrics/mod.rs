//! Metrics module
//!
//! Prometheus gauges and counters fed by the health cycle, rendered in the
//! text exposition format for the `/metrics` endpoint.

use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::error::{Error, Result};
use crate::introspect::MemoryUsage;
use crate::report::{HealthRecord, HealthReporter};

const NAMESPACE: &str = "healthwatch";

/// Registry and handles for every exported metric
#[derive(Clone)]
pub struct MonitorMetrics {
    registry: Registry,
    cpu_percent: Gauge,
    memory_percent: Gauge,
    disk_percent: Gauge,
    healthy: IntGauge,
    checks_total: IntCounterVec,
    sample_failures_total: IntCounter,
    process_resident_bytes: IntGauge,
}

impl MonitorMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let cpu_percent = Gauge::with_opts(
            Opts::new("cpu_percent", "CPU utilisation at the last health check").namespace(NAMESPACE),
        )?;
        let memory_percent = Gauge::with_opts(
            Opts::new("memory_percent", "Memory utilisation at the last health check")
                .namespace(NAMESPACE),
        )?;
        let disk_percent = Gauge::with_opts(
            Opts::new("disk_percent", "Disk utilisation at the last health check")
                .namespace(NAMESPACE),
        )?;
        let healthy = IntGauge::with_opts(
            Opts::new("healthy", "1 if the last health check was healthy, 0 otherwise")
                .namespace(NAMESPACE),
        )?;
        let checks_total = IntCounterVec::new(
            Opts::new("checks_total", "Completed health checks by status").namespace(NAMESPACE),
            &["status"],
        )?;
        let sample_failures_total = IntCounter::with_opts(
            Opts::new("sample_failures_total", "Health checks skipped due to failed samples")
                .namespace(NAMESPACE),
        )?;
        let process_resident_bytes = IntGauge::with_opts(
            Opts::new("process_resident_bytes", "Resident memory of the monitor process")
                .namespace(NAMESPACE),
        )?;

        registry.register(Box::new(cpu_percent.clone()))?;
        registry.register(Box::new(memory_percent.clone()))?;
        registry.register(Box::new(disk_percent.clone()))?;
        registry.register(Box::new(healthy.clone()))?;
        registry.register(Box::new(checks_total.clone()))?;
        registry.register(Box::new(sample_failures_total.clone()))?;
        registry.register(Box::new(process_resident_bytes.clone()))?;

        Ok(Self {
            registry,
            cpu_percent,
            memory_percent,
            disk_percent,
            healthy,
            checks_total,
            sample_failures_total,
            process_resident_bytes,
        })
    }

    /// Completed checks with the given status label
    pub fn checks(&self, status: &str) -> u64 {
        self.checks_total.with_label_values(&[status]).get()
    }

    pub fn sample_failures(&self) -> u64 {
        self.sample_failures_total.get()
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| Error::Internal(format!("metrics output is not UTF-8: {}", e)))
    }
}

impl std::fmt::Debug for MonitorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorMetrics").finish_non_exhaustive()
    }
}

// =============================================================================
// Reporter
// =============================================================================

/// Reporter that updates [`MonitorMetrics`]
#[derive(Debug, Clone)]
pub struct MetricsReporter {
    metrics: MonitorMetrics,
}

impl MetricsReporter {
    pub fn new(metrics: MonitorMetrics) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &MonitorMetrics {
        &self.metrics
    }
}

impl HealthReporter for MetricsReporter {
    fn report(&self, record: &HealthRecord) {
        self.metrics.cpu_percent.set(record.cpu_percent);
        self.metrics.memory_percent.set(record.memory_percent);
        self.metrics.disk_percent.set(record.disk_percent);
        self.metrics
            .healthy
            .set(i64::from(record.status.is_healthy()));
        self.metrics
            .checks_total
            .with_label_values(&[record.status.as_str()])
            .inc();
    }

    fn report_failure(&self, _tick: u64, _error: &Error) {
        self.metrics.sample_failures_total.inc();
    }

    fn report_memory(&self, usage: &MemoryUsage) {
        self.metrics
            .process_resident_bytes
            .set(i64::try_from(usage.resident_bytes).unwrap_or(i64::MAX));
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthStatus;
    use crate::sampler::{MetricsSnapshot, Reading};
    use chrono::Utc;

    fn record(cpu: f64, status: HealthStatus) -> HealthRecord {
        let snapshot =
            MetricsSnapshot::new("test", Reading::new(cpu, 20.0, 30.0), Utc::now()).unwrap();
        HealthRecord::new(1, &snapshot, 80.0, status)
    }

    #[test]
    fn test_reporter_updates_metrics() {
        let reporter = MetricsReporter::new(MonitorMetrics::new().unwrap());

        reporter.report(&record(50.0, HealthStatus::Healthy));
        reporter.report(&record(95.0, HealthStatus::Warning));
        reporter.report_failure(
            3,
            &Error::Collector {
                collector: "test",
                reason: "down".into(),
            },
        );

        let metrics = reporter.metrics();
        assert_eq!(metrics.checks("healthy"), 1);
        assert_eq!(metrics.checks("warning"), 1);
        assert_eq!(metrics.sample_failures(), 1);
        assert_eq!(metrics.cpu_percent.get(), 95.0);
        assert_eq!(metrics.healthy.get(), 0);
    }

    #[test]
    fn test_render_text_format() {
        let reporter = MetricsReporter::new(MonitorMetrics::new().unwrap());
        reporter.report(&record(42.0, HealthStatus::Healthy));
        reporter.report_memory(&MemoryUsage {
            resident_bytes: 2048,
            virtual_bytes: 8192,
        });

        let text = reporter.metrics().render().unwrap();
        assert!(text.contains("healthwatch_cpu_percent 42"));
        assert!(text.contains("healthwatch_checks_total{status=\"healthy\"} 1"));
        assert!(text.contains("healthwatch_process_resident_bytes 2048"));
    }

    #[test]
    fn test_independent_registries() {
        // Each instance owns its registry, so constructing twice must not collide.
        assert!(MonitorMetrics::new().is_ok());
        assert!(MonitorMetrics::new().is_ok());
    }
}
