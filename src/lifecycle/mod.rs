//! Lifecycle controller
//!
//! Owns the recurring tasks of a running monitor.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────┐ immediate cycle ┌─────────┐  signal   ┌──────────────┐ tasks joined ┌─────────┐
//! │ Starting │────────────────▶│ Running │──────────▶│ ShuttingDown │─────────────▶│ Stopped │
//! └──────────┘                 └─────────┘           └──────────────┘              └─────────┘
//! ```
//!
//! The health cycle runs once during startup, then every `interval`. The
//! optional memory task has its own period and never shares a timer with
//! the health cycle. Cancellation is observed between ticks only.

mod controller;
mod cycle;
mod signal;
mod task;

pub use controller::{Monitor, MonitorHandle, DEFAULT_SHUTDOWN_GRACE};
pub use cycle::HealthCycle;
pub use signal::ShutdownSignal;
pub use task::RecurringTask;

use serde::Serialize;

/// Lifecycle state of a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
    Starting,
    Running,
    ShuttingDown,
    Stopped,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        *self == LifecycleState::Stopped
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Starting => write!(f, "Starting"),
            LifecycleState::Running => write!(f, "Running"),
            LifecycleState::ShuttingDown => write!(f, "ShuttingDown"),
            LifecycleState::Stopped => write!(f, "Stopped"),
        }
    }
}
