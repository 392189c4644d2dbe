//! One sample-classify-emit pass.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::instrument;

use crate::health::ThresholdEvaluator;
use crate::report::{HealthRecord, HealthReporter};
use crate::sampler::Sampler;

/// The health-check body shared by the startup pass and the recurring task
pub struct HealthCycle {
    sampler: Sampler,
    evaluator: ThresholdEvaluator,
    reporter: Arc<dyn HealthReporter>,
    ticks: AtomicU64,
}

impl HealthCycle {
    pub fn new(
        sampler: Sampler,
        evaluator: ThresholdEvaluator,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            sampler,
            evaluator,
            reporter,
            ticks: AtomicU64::new(0),
        }
    }

    /// Number of cycles started so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Sample, classify and emit once.
    ///
    /// Returns `None` when the sample failed; the failure has already been
    /// handed to the reporter.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> Option<HealthRecord> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;

        match self.sampler.sample().await {
            Ok(snapshot) => {
                let status = self.evaluator.classify(&snapshot);
                let record =
                    HealthRecord::new(tick, &snapshot, self.evaluator.threshold_percent(), status);
                self.reporter.report(&record);
                Some(record)
            }
            Err(e) => {
                self.reporter.report_failure(tick, &e);
                None
            }
        }
    }
}

impl std::fmt::Debug for HealthCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthCycle")
            .field("sampler", &self.sampler)
            .field("evaluator", &self.evaluator)
            .field("ticks", &self.ticks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthStatus;
    use crate::report::InMemoryReporter;
    use crate::sampler::{FixtureCollector, FixtureStep, Reading};

    #[tokio::test]
    async fn test_run_once_emits_record() {
        let reporter = Arc::new(InMemoryReporter::new());
        let collector = Arc::new(FixtureCollector::readings([
            Reading::new(81.0, 10.0, 10.0),
            Reading::new(80.0, 80.0, 80.0),
        ]));
        let cycle = HealthCycle::new(
            Sampler::new(collector),
            ThresholdEvaluator::new(80.0),
            reporter.clone(),
        );

        let first = cycle.run_once().await.unwrap();
        assert_eq!(first.tick, 1);
        assert_eq!(first.status, HealthStatus::Warning);

        let second = cycle.run_once().await.unwrap();
        assert_eq!(second.tick, 2);
        assert_eq!(second.status, HealthStatus::Healthy);

        assert_eq!(reporter.records(), vec![first, second]);
        assert_eq!(cycle.ticks(), 2);
    }

    #[tokio::test]
    async fn test_failed_sample_skips_record() {
        let reporter = Arc::new(InMemoryReporter::new());
        let collector = Arc::new(FixtureCollector::new(vec![
            FixtureStep::Fail("disk probe failed".into()),
            FixtureStep::Reading(Reading::new(1.0, 2.0, 3.0)),
        ]));
        let cycle = HealthCycle::new(
            Sampler::new(collector),
            ThresholdEvaluator::new(80.0),
            reporter.clone(),
        );

        assert!(cycle.run_once().await.is_none());
        assert!(cycle.run_once().await.is_some());

        let failures = reporter.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, 1);
        assert!(failures[0].1.contains("disk probe failed"));
        assert_eq!(reporter.records().len(), 1);
        assert_eq!(reporter.records()[0].tick, 2);
    }
}
