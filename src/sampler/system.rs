//! Host utilisation read through sysinfo.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, RefreshKind, System};

use super::{Collector, Reading};
use crate::error::{Error, Result};

struct HostState {
    sys: System,
    disks: Disks,
}

impl HostState {
    fn new() -> Self {
        let mut sys = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        // CPU usage is a delta; prime the baseline.
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        Self {
            sys,
            disks: Disks::new_with_refreshed_list(),
        }
    }

    fn read(&mut self) -> Result<Reading> {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();
        self.disks.refresh();
        if self.disks.list().is_empty() {
            self.disks.refresh_list();
        }

        let total_memory = self.sys.total_memory();
        if total_memory == 0 {
            return Err(Error::Collector {
                collector: "system",
                reason: "total memory reported as zero".into(),
            });
        }
        let memory_percent = self.sys.used_memory() as f64 / total_memory as f64 * 100.0;

        let (used, total) = self
            .disks
            .list()
            .iter()
            .fold((0u128, 0u128), |(used, total), disk| {
                let total_space = disk.total_space() as u128;
                let available = disk.available_space() as u128;
                (
                    used + total_space.saturating_sub(available),
                    total + total_space,
                )
            });
        let disk_percent = if total > 0 {
            used as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Ok(Reading::new(
            f64::from(self.sys.global_cpu_usage()).clamp(0.0, 100.0),
            memory_percent.clamp(0.0, 100.0),
            disk_percent.clamp(0.0, 100.0),
        ))
    }
}

/// Collector backed by the operating system.
///
/// Refreshes run on the blocking thread pool so a slow `/proc` or disk
/// enumeration never stalls the scheduler; the sampler timeout still applies.
#[derive(Clone)]
pub struct SystemCollector {
    state: Arc<Mutex<HostState>>,
}

impl SystemCollector {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState::new())),
        }
    }
}

impl Default for SystemCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SystemCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemCollector").finish_non_exhaustive()
    }
}

#[async_trait]
impl Collector for SystemCollector {
    fn name(&self) -> &'static str {
        "system"
    }

    async fn collect(&self) -> Result<Reading> {
        let state = Arc::clone(&self.state);
        // A read abandoned by the sampler timeout may still hold the lock.
        tokio::task::spawn_blocking(move || match state.try_lock() {
            Some(mut host) => host.read(),
            None => Err(Error::Collector {
                collector: "system",
                reason: "previous collection still running".into(),
            }),
        })
        .await
        .map_err(|e| Error::Collector {
            collector: "system",
            reason: format!("collection task failed: {}", e),
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_reads_host_within_range() {
        let collector = SystemCollector::new();
        let reading = collector.collect().await.unwrap();

        for value in [reading.cpu_percent, reading.memory_percent, reading.disk_percent] {
            assert!(value.is_finite());
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[tokio::test]
    async fn test_busy_collection_fails_fast() {
        let collector = SystemCollector::new();
        let _held = collector.state.lock();

        let err = collector.collect().await.unwrap_err();
        assert_matches!(
            err,
            Error::Collector { collector: "system", reason } if reason.contains("still running")
        );
    }
}
