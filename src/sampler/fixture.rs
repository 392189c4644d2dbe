//! Scripted collector for tests and demos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Collector, Reading};
use crate::error::{Error, Result};

/// One scripted collector response
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureStep {
    /// Return this reading
    Reading(Reading),
    /// Fail with this reason
    Fail(String),
    /// Sleep this long before answering with the last good reading
    Stall(Duration),
}

/// Collector that replays a fixed script.
///
/// Steps are consumed in order; once only one remains it is repeated for
/// every further call.
#[derive(Debug)]
pub struct FixtureCollector {
    steps: Mutex<VecDeque<FixtureStep>>,
    last_reading: Mutex<Reading>,
    calls: AtomicU64,
}

impl FixtureCollector {
    /// Create from a script. An empty script always reads 0%.
    pub fn new(steps: Vec<FixtureStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            last_reading: Mutex::new(Reading::new(0.0, 0.0, 0.0)),
            calls: AtomicU64::new(0),
        }
    }

    /// Create from readings only.
    pub fn readings(readings: impl IntoIterator<Item = Reading>) -> Self {
        Self::new(readings.into_iter().map(FixtureStep::Reading).collect())
    }

    /// Number of `collect` calls so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Option<FixtureStep> {
        let mut steps = self.steps.lock();
        if steps.len() > 1 {
            steps.pop_front()
        } else {
            steps.front().cloned()
        }
    }
}

#[async_trait]
impl Collector for FixtureCollector {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn collect(&self) -> Result<Reading> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.next_step() {
            Some(FixtureStep::Reading(reading)) => {
                *self.last_reading.lock() = reading;
                Ok(reading)
            }
            Some(FixtureStep::Fail(reason)) => Err(Error::Collector {
                collector: self.name(),
                reason,
            }),
            Some(FixtureStep::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(*self.last_reading.lock())
            }
            None => Ok(*self.last_reading.lock()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_repeat_last() {
        let collector = FixtureCollector::new(vec![
            FixtureStep::Reading(Reading::new(1.0, 1.0, 1.0)),
            FixtureStep::Fail("boom".into()),
            FixtureStep::Reading(Reading::new(3.0, 3.0, 3.0)),
        ]);

        assert_eq!(collector.collect().await.unwrap().cpu_percent, 1.0);
        assert!(collector.collect().await.is_err());
        assert_eq!(collector.collect().await.unwrap().cpu_percent, 3.0);
        assert_eq!(collector.collect().await.unwrap().cpu_percent, 3.0);
        assert_eq!(collector.calls(), 4);
    }

    #[tokio::test]
    async fn test_empty_script_reads_zero() {
        let collector = FixtureCollector::new(Vec::new());
        let reading = collector.collect().await.unwrap();
        assert_eq!(reading, Reading::new(0.0, 0.0, 0.0));
    }
}
