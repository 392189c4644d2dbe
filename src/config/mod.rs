//! Configuration module
//!
//! Resolves a runtime [`Profile`] into one immutable [`EffectiveConfig`].
//! Development values are applied on top of the production base one whole
//! field at a time; operator overrides from the command line use the same
//! replacement rule.

mod profile;

pub use profile::{
    profile_source, profile_source_from_env, Profile, APP_ENV_VAR, DEFAULT_PROFILE,
    MONITOR_ENV_VAR,
};

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use serde::Serialize;

use crate::error::{Error, Result};

// =============================================================================
// Effective Configuration
// =============================================================================

/// Configuration in force for the lifetime of the process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveConfig {
    /// Profile this configuration was resolved from
    pub profile: Profile,

    /// Period of the health-check cycle
    pub interval: Duration,

    /// Peak usage above this percentage is a warning
    pub alert_threshold_percent: f64,

    /// Detailed health records
    pub verbose: bool,

    /// Development diagnostics in the startup banner
    pub debug: bool,

    /// Period of the memory introspection task, `None` when disabled
    pub memory_log_interval: Option<Duration>,

    /// Where the metrics endpoint binds when enabled
    pub metrics_addr: SocketAddr,
}

impl EffectiveConfig {
    /// Production base configuration
    pub fn production() -> Self {
        Self {
            profile: Profile::Production,
            interval: Duration::from_millis(60_000),
            alert_threshold_percent: 80.0,
            verbose: false,
            debug: false,
            memory_log_interval: None,
            metrics_addr: local_addr(8080),
        }
    }

    /// Replace every field that `overrides` sets.
    pub fn apply(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(interval) = overrides.interval {
            self.interval = interval;
        }
        if let Some(threshold) = overrides.alert_threshold_percent {
            self.alert_threshold_percent = threshold;
        }
        if let Some(verbose) = overrides.verbose {
            self.verbose = verbose;
        }
        if let Some(debug) = overrides.debug {
            self.debug = debug;
        }
        if let Some(memory_log_interval) = overrides.memory_log_interval {
            self.memory_log_interval = memory_log_interval;
        }
        if let Some(addr) = overrides.metrics_addr {
            self.metrics_addr = addr;
        }
        self
    }

    /// Whether the memory introspection task should run
    pub fn memory_logging_enabled(&self) -> bool {
        self.memory_log_interval.is_some()
    }
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self::production()
    }
}

fn local_addr(port: u16) -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
}

// =============================================================================
// Overrides
// =============================================================================

/// Whole-field replacements layered over a base configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub interval: Option<Duration>,
    pub alert_threshold_percent: Option<f64>,
    pub verbose: Option<bool>,
    pub debug: Option<bool>,
    /// `Some(None)` disables memory logging
    pub memory_log_interval: Option<Option<Duration>>,
    pub metrics_addr: Option<SocketAddr>,
}

impl ConfigOverrides {
    /// Values the development profile replaces
    pub fn development() -> Self {
        Self {
            interval: Some(Duration::from_millis(5_000)),
            alert_threshold_percent: Some(90.0),
            verbose: Some(true),
            debug: Some(true),
            memory_log_interval: Some(Some(Duration::from_millis(30_000))),
            metrics_addr: Some(local_addr(3000)),
        }
    }

    /// Check operator-supplied values before they are applied.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_some_and(|i| i.is_zero()) {
            return Err(Error::Config("interval must be positive".into()));
        }
        if let Some(threshold) = self.alert_threshold_percent {
            if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
                return Err(Error::Config(format!(
                    "alert threshold must be within 0-100, got {}",
                    threshold
                )));
            }
        }
        if let Some(Some(interval)) = self.memory_log_interval {
            if interval.is_zero() {
                return Err(Error::Config(
                    "memory log interval must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolve a raw profile string into the effective configuration.
///
/// Unrecognized values resolve to production; this never fails.
pub fn resolve(profile_source: &str) -> EffectiveConfig {
    let profile = Profile::parse(profile_source);
    let base = EffectiveConfig::production();

    match profile {
        Profile::Production => base,
        Profile::Development => EffectiveConfig {
            profile,
            ..base.apply(&ConfigOverrides::development())
        },
    }
}

/// Parse a metrics bind address given on the command line.
pub fn parse_metrics_addr(raw: &str) -> Result<SocketAddr> {
    raw.parse()
        .map_err(|e| Error::Config(format!("invalid metrics address '{}': {}", raw, e)))
}

// =============================================================================
// Tests
// =============================================================================
