//! healthwatch - Periodic Host Health Checks
//!
//! Samples CPU, memory and disk utilisation on a fixed cadence, classifies
//! each sample against an alert threshold and emits one health record per
//! tick until the process is asked to stop.
//!
//! # Architecture
//!
//! ```text
//! ConfigResolver → Sampler (Eyes) → ThresholdEvaluator → Reporters
//!                        ▲
//!                Lifecycle Controller (Brain)
//! ```
//!
//! # Modules
//!
//! - [`config`] - Profile resolution and the effective configuration
//! - [`sampler`] - Collector port, snapshots and collector implementations
//! - [`health`] - Threshold classification
//! - [`report`] - Health records and reporter sinks
//! - [`metrics`] - Prometheus metrics fed by the health cycle
//! - [`introspect`] - Memory usage of the monitor process
//! - [`lifecycle`] - Recurring tasks, state machine and signal handling
//! - [`server`] - Optional `/metrics` HTTP endpoint
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod health;
pub mod introspect;
pub mod lifecycle;
pub mod metrics;
pub mod report;
pub mod sampler;
pub mod server;

// Re-export commonly used types
pub use config::{resolve, EffectiveConfig, Profile};
pub use error::{Error, Result};
pub use health::{classify, HealthStatus, ThresholdEvaluator};
pub use lifecycle::{LifecycleState, Monitor, MonitorHandle};
pub use report::{HealthRecord, HealthReporter};
pub use sampler::{Collector, MetricsSnapshot, Sampler};
