//! healthwatch
//!
//! Periodic host health checks with alert thresholds.
//!
//! # Usage
//!
//! ```text
//! healthwatch                                  # production profile
//! MONITOR_ENV=development healthwatch          # development profile
//! healthwatch --collector system --serve-metrics
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use healthwatch::config::{
    parse_metrics_addr, profile_source_from_env, resolve, ConfigOverrides, EffectiveConfig,
};
use healthwatch::error::Result;
use healthwatch::lifecycle::{Monitor, ShutdownSignal};
use healthwatch::metrics::{MetricsReporter, MonitorMetrics};
use healthwatch::report::{CompositeReporter, HealthReporter, LoggingReporter};
use healthwatch::sampler::{Collector, Sampler, SimulatedCollector, SystemCollector};
use healthwatch::server;

// =============================================================================
// CLI Arguments
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CollectorKind {
    /// Random values, no host access
    Simulated,
    /// Real host utilisation
    System,
}

/// healthwatch - periodic health checks with alert thresholds
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Profile to run (overrides MONITOR_ENV / APP_ENV)
    #[arg(long)]
    profile: Option<String>,

    /// Metric source
    #[arg(long, env = "MONITOR_COLLECTOR", value_enum, default_value = "simulated")]
    collector: CollectorKind,

    /// Upper bound on a single collection in milliseconds
    #[arg(long, env = "MONITOR_COLLECTOR_TIMEOUT_MS", default_value = "2000")]
    collector_timeout_ms: u64,

    /// Override the health-check interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Override the alert threshold percentage
    #[arg(long)]
    alert_threshold: Option<f64>,

    /// Override the memory introspection interval in milliseconds (0 disables)
    #[arg(long)]
    memory_log_interval_ms: Option<u64>,

    /// Serve Prometheus metrics
    #[arg(long, env = "MONITOR_SERVE_METRICS")]
    serve_metrics: bool,

    /// Override the metrics bind address
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,

    /// Time allowed for in-flight ticks at shutdown, in milliseconds
    #[arg(long, default_value = "5000")]
    shutdown_grace_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn overrides(&self) -> Result<ConfigOverrides> {
        let overrides = ConfigOverrides {
            interval: self.interval_ms.map(Duration::from_millis),
            alert_threshold_percent: self.alert_threshold,
            memory_log_interval: self
                .memory_log_interval_ms
                .map(|ms| (ms > 0).then(|| Duration::from_millis(ms))),
            metrics_addr: self
                .metrics_addr
                .as_deref()
                .map(parse_metrics_addr)
                .transpose()?,
            ..Default::default()
        };
        overrides.validate()?;
        Ok(overrides)
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let source = args.profile.clone().unwrap_or_else(profile_source_from_env);
    let config = Arc::new(resolve(&source).apply(&args.overrides()?));

    log_banner(&config, &args);

    let signal = ShutdownSignal::install()?;

    let collector: Arc<dyn Collector> = match args.collector {
        CollectorKind::Simulated => Arc::new(SimulatedCollector::new()),
        CollectorKind::System => Arc::new(SystemCollector::new()),
    };
    let sampler = Sampler::with_timeout(collector, Duration::from_millis(args.collector_timeout_ms));

    let log_reporter = if config.verbose {
        LoggingReporter::verbose(config.interval)
    } else {
        LoggingReporter::concise()
    };
    let metrics = MonitorMetrics::new()?;
    let reporter: Arc<dyn HealthReporter> = Arc::new(
        CompositeReporter::new()
            .with(Arc::new(log_reporter))
            .with(Arc::new(MetricsReporter::new(metrics.clone()))),
    );

    let handle = Monitor::new(Arc::clone(&config), sampler, reporter)
        .with_shutdown_grace(Duration::from_millis(args.shutdown_grace_ms))
        .start()
        .await?;

    if args.serve_metrics {
        let addr = config.metrics_addr;
        let token = handle.cancellation_token();
        tokio::spawn(async move {
            if let Err(e) = server::run_metrics_server(addr, metrics, token).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    let state = handle
        .run_until(async move {
            let name = signal.recv().await;
            info!("Received {}. Shutting down monitor...", name);
        })
        .await;

    info!("Monitor {}", state);
    Ok(())
}

// =============================================================================
// Startup Banner
// =============================================================================

fn log_banner(config: &EffectiveConfig, args: &Args) {
    info!("Starting healthwatch {}", env!("CARGO_PKG_VERSION"));
    info!("  Mode: {}", config.profile.as_str().to_uppercase());
    info!("  Collector: {:?}", args.collector);
    info!("  Monitoring every {}ms", config.interval.as_millis());

    if config.debug {
        info!("  Development mode: ENABLED");
        info!("  Metrics endpoint: http://{}/metrics", config.metrics_addr);
    }
    if config.verbose {
        info!("  Alert threshold: {}%", config.alert_threshold_percent);
    }
    if let Some(interval) = config.memory_log_interval {
        info!("  Memory logging every {}ms", interval.as_millis());
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["healthwatch"]);
        assert_eq!(args.collector, CollectorKind::Simulated);
        assert_eq!(args.collector_timeout_ms, 2000);
        assert!(args.overrides().unwrap().is_empty());
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "healthwatch",
            "--interval-ms",
            "1000",
            "--alert-threshold",
            "75",
            "--memory-log-interval-ms",
            "0",
            "--metrics-addr",
            "0.0.0.0:9100",
        ]);
        let overrides = args.overrides().unwrap();
        assert_eq!(overrides.interval, Some(Duration::from_millis(1000)));
        assert_eq!(overrides.alert_threshold_percent, Some(75.0));
        assert_eq!(overrides.memory_log_interval, Some(None));
        assert_eq!(
            overrides.metrics_addr,
            Some("0.0.0.0:9100".parse::<std::net::SocketAddr>().unwrap())
        );
    }

    #[test]
    fn test_args_reject_invalid_threshold() {
        let args = Args::parse_from(["healthwatch", "--alert-threshold", "150"]);
        assert!(args.overrides().is_err());
    }
}
