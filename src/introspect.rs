//! Memory introspection of the monitor process itself.

use parking_lot::Mutex;
use serde::Serialize;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::error::{Error, Result};

/// Memory held by the monitor process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    pub resident_bytes: u64,
    pub virtual_bytes: u64,
}

/// Source of process memory readings
pub trait MemoryIntrospector: Send + Sync {
    fn memory_usage(&self) -> Result<MemoryUsage>;
}

/// Reads the current process through sysinfo
pub struct ProcessMemoryIntrospector {
    pid: Pid,
    sys: Mutex<System>,
}

impl ProcessMemoryIntrospector {
    pub fn new() -> Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| Error::Introspection(format!("cannot determine own pid: {}", e)))?;

        Ok(Self {
            pid,
            sys: Mutex::new(System::new()),
        })
    }
}

impl std::fmt::Debug for ProcessMemoryIntrospector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessMemoryIntrospector")
            .field("pid", &self.pid)
            .finish()
    }
}

impl MemoryIntrospector for ProcessMemoryIntrospector {
    fn memory_usage(&self) -> Result<MemoryUsage> {
        let mut sys = self.sys.lock();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::new().with_memory(),
        );

        sys.process(self.pid)
            .map(|process| MemoryUsage {
                resident_bytes: process.memory(),
                virtual_bytes: process.virtual_memory(),
            })
            .ok_or_else(|| Error::Introspection(format!("process {} not found", self.pid)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_own_process() {
        let introspector = ProcessMemoryIntrospector::new().unwrap();
        let usage = introspector.memory_usage().unwrap();
        assert!(usage.resident_bytes > 0);
    }
}
