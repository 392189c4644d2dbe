//! Error types for healthwatch

use std::time::Duration;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the monitor
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prometheus registry error
    #[error("Metrics registry error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // =========================================================================
    // Sample Failures
    // =========================================================================
    /// Collector did not answer in time
    #[error("Collector '{collector}' timed out after {timeout:?}")]
    SampleTimeout {
        collector: &'static str,
        timeout: Duration,
    },

    /// Collector reported an error
    #[error("Collector '{collector}' failed: {reason}")]
    Collector {
        collector: &'static str,
        reason: String,
    },

    /// Collector returned a value outside 0-100
    #[error("Collector '{collector}' returned invalid {metric} reading: {value}")]
    InvalidSample {
        collector: &'static str,
        metric: &'static str,
        value: f64,
    },

    // =========================================================================
    // Lifecycle Errors
    // =========================================================================
    /// The recurring-task scheduler could not be established
    #[error("Fatal startup error: {0}")]
    FatalStartup(String),

    /// Process memory could not be read
    #[error("Memory introspection failed: {0}")]
    Introspection(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error belongs to a single failed sample.
    ///
    /// Sample failures are reported and skipped; they never stop the monitor.
    pub fn is_sample_failure(&self) -> bool {
        matches!(
            self,
            Error::SampleTimeout { .. } | Error::Collector { .. } | Error::InvalidSample { .. }
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
