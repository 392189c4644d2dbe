//! Random utilisation values.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Collector, Reading};
use crate::error::Result;

/// Collector producing uniform random percentages in `[0, 100)`
#[derive(Debug)]
pub struct SimulatedCollector {
    rng: Mutex<StdRng>,
}

impl SimulatedCollector {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for SimulatedCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for SimulatedCollector {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn collect(&self) -> Result<Reading> {
        let mut rng = self.rng.lock();
        Ok(Reading::new(
            rng.gen_range(0.0..100.0),
            rng.gen_range(0.0..100.0),
            rng.gen_range(0.0..100.0),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_in_range() {
        let collector = SimulatedCollector::new();
        for _ in 0..200 {
            let reading = collector.collect().await.unwrap();
            for value in [reading.cpu_percent, reading.memory_percent, reading.disk_percent] {
                assert!((0.0..100.0).contains(&value));
            }
        }
    }

    #[tokio::test]
    async fn test_seeded_is_reproducible() {
        let a = SimulatedCollector::seeded(42);
        let b = SimulatedCollector::seeded(42);
        for _ in 0..10 {
            assert_eq!(a.collect().await.unwrap(), b.collect().await.unwrap());
        }
    }
}
