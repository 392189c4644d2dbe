//! In-memory reporter for tests.

use parking_lot::RwLock;

use super::{HealthRecord, HealthReporter};
use crate::error::Error;
use crate::introspect::MemoryUsage;

/// Collects everything it is handed for later inspection.
#[derive(Debug, Default)]
pub struct InMemoryReporter {
    records: RwLock<Vec<HealthRecord>>,
    failures: RwLock<Vec<(u64, String)>>,
    memory: RwLock<Vec<MemoryUsage>>,
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All health records, oldest first.
    pub fn records(&self) -> Vec<HealthRecord> {
        self.records.read().clone()
    }

    /// Failed ticks with the rendered error.
    pub fn failures(&self) -> Vec<(u64, String)> {
        self.failures.read().clone()
    }

    pub fn memory_readings(&self) -> Vec<MemoryUsage> {
        self.memory.read().clone()
    }

    /// Records plus failures: every health cycle that finished.
    pub fn cycles(&self) -> usize {
        self.records.read().len() + self.failures.read().len()
    }
}

impl HealthReporter for InMemoryReporter {
    fn report(&self, record: &HealthRecord) {
        self.records.write().push(record.clone());
    }

    fn report_failure(&self, tick: u64, error: &Error) {
        self.failures.write().push((tick, error.to_string()));
    }

    fn report_memory(&self, usage: &MemoryUsage) {
        self.memory.write().push(*usage);
    }
}
