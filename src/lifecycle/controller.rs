//! Monitor - "The Brain"
//!
//! Wires the sampler, evaluator and reporters into recurring tasks and drives
//! them through the lifecycle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::cycle::HealthCycle;
use super::task::RecurringTask;
use super::LifecycleState;
use crate::config::EffectiveConfig;
use crate::error::{Error, Result};
use crate::health::ThresholdEvaluator;
use crate::introspect::{MemoryIntrospector, ProcessMemoryIntrospector};
use crate::report::HealthReporter;
use crate::sampler::Sampler;

/// How long shutdown waits for in-flight ticks before aborting them
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

const HEALTH_TASK: &str = "health-check";
const MEMORY_TASK: &str = "memory-introspection";

// =============================================================================
// Monitor
// =============================================================================

/// A configured monitor that has not started yet
pub struct Monitor {
    config: Arc<EffectiveConfig>,
    sampler: Sampler,
    reporter: Arc<dyn HealthReporter>,
    introspector: Option<Arc<dyn MemoryIntrospector>>,
    shutdown_grace: Duration,
    state: Arc<RwLock<LifecycleState>>,
}

impl Monitor {
    pub fn new(
        config: Arc<EffectiveConfig>,
        sampler: Sampler,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            config,
            sampler,
            reporter,
            introspector: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            state: Arc::new(RwLock::new(LifecycleState::Starting)),
        }
    }

    /// [`LifecycleState::Starting`] until [`Monitor::start`] hands over to
    /// the returned [`MonitorHandle`]
    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    /// Use a specific memory source instead of the current process.
    pub fn with_memory_introspector(mut self, introspector: Arc<dyn MemoryIntrospector>) -> Self {
        self.introspector = Some(introspector);
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Run the first health cycle and schedule the recurring tasks.
    ///
    /// Returns [`Error::FatalStartup`] when called outside a tokio runtime.
    #[instrument(skip(self), fields(profile = %self.config.profile))]
    pub async fn start(self) -> Result<MonitorHandle> {
        let state = self.state;

        let runtime = Handle::try_current()
            .map_err(|e| Error::FatalStartup(format!("cannot schedule recurring tasks: {}", e)))?;

        let cycle = Arc::new(HealthCycle::new(
            self.sampler,
            ThresholdEvaluator::new(self.config.alert_threshold_percent),
            Arc::clone(&self.reporter),
        ));

        // First health state is known before the first interval elapses.
        cycle.run_once().await;

        let token = CancellationToken::new();
        let mut tasks = Vec::with_capacity(2);

        let health_cycle = Arc::clone(&cycle);
        tasks.push(RecurringTask::spawn(
            &runtime,
            HEALTH_TASK,
            self.config.interval,
            token.child_token(),
            move || {
                let cycle = Arc::clone(&health_cycle);
                async move {
                    cycle.run_once().await;
                }
            },
        ));

        if let Some(period) = self.config.memory_log_interval {
            match self.introspector.map(Ok).unwrap_or_else(default_introspector) {
                Ok(introspector) => {
                    let reporter = Arc::clone(&self.reporter);
                    tasks.push(RecurringTask::spawn(
                        &runtime,
                        MEMORY_TASK,
                        period,
                        token.child_token(),
                        move || {
                            let introspector = Arc::clone(&introspector);
                            let reporter = Arc::clone(&reporter);
                            async move {
                                match introspector.memory_usage() {
                                    Ok(usage) => reporter.report_memory(&usage),
                                    Err(e) => warn!("Memory introspection failed: {}", e),
                                }
                            }
                        },
                    ));
                }
                Err(e) => warn!("Memory logging disabled: {}", e),
            }
        }

        *state.write() = LifecycleState::Running;
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            tasks = tasks.len(),
            "Monitor running"
        );

        Ok(MonitorHandle {
            state,
            token,
            tasks,
            cycle,
            shutdown_grace: self.shutdown_grace,
        })
    }
}

fn default_introspector() -> Result<Arc<dyn MemoryIntrospector>> {
    Ok(Arc::new(ProcessMemoryIntrospector::new()?))
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.config)
            .field("sampler", &self.sampler)
            .field("shutdown_grace", &self.shutdown_grace)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Running Monitor
// =============================================================================

/// Handle to a started monitor
pub struct MonitorHandle {
    state: Arc<RwLock<LifecycleState>>,
    token: CancellationToken,
    tasks: Vec<RecurringTask>,
    cycle: Arc<HealthCycle>,
    shutdown_grace: Duration,
}

impl MonitorHandle {
    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    /// Health cycles started so far, including the startup pass
    pub fn ticks(&self) -> u64 {
        self.cycle.ticks()
    }

    /// Names of the scheduled recurring tasks
    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(RecurringTask::name).collect()
    }

    /// Token that stops the recurring tasks when cancelled.
    ///
    /// Cancelling it makes [`MonitorHandle::run_until`] shut down as if the
    /// stop signal had fired.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Run until `signal` resolves or the token is cancelled, then shut down.
    pub async fn run_until<F>(self, signal: F) -> LifecycleState
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = signal => {}
            _ = self.token.cancelled() => {}
        }
        self.shutdown().await
    }

    /// Cancel every recurring task and wait for them to finish.
    ///
    /// A tick already in progress completes first. Tasks still running after
    /// the grace period are aborted.
    #[instrument(skip(self))]
    pub async fn shutdown(self) -> LifecycleState {
        *self.state.write() = LifecycleState::ShuttingDown;
        info!("Shutting down monitor");

        self.token.cancel();

        let aborts: Vec<_> = self.tasks.iter().map(RecurringTask::abort_handle).collect();
        let handles = self.tasks.into_iter().map(RecurringTask::into_join_handle);

        match tokio::time::timeout(self.shutdown_grace, join_all(handles)).await {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result {
                        warn!("Recurring task ended abnormally: {}", e);
                    }
                }
            }
            Err(_) => {
                warn!(
                    grace_ms = self.shutdown_grace.as_millis() as u64,
                    "Recurring tasks did not stop within grace period, aborting"
                );
                for abort in aborts {
                    abort.abort();
                }
            }
        }

        *self.state.write() = LifecycleState::Stopped;
        debug!(ticks = self.cycle.ticks(), "Monitor stopped");
        LifecycleState::Stopped
    }
}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle")
            .field("state", &self.state())
            .field("tasks", &self.task_names())
            .field("ticks", &self.ticks())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
