//! Cancellable recurring tasks.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A body run every `period` until its token is cancelled.
///
/// The first tick fires one period after spawning. Each tick runs the body
/// to completion before waiting for the next one, so a task never overlaps
/// itself, and cancellation is only observed while waiting. Ticks missed
/// because a body overran are skipped.
#[derive(Debug)]
pub struct RecurringTask {
    name: &'static str,
    period: Duration,
    handle: JoinHandle<()>,
}

impl RecurringTask {
    pub fn spawn<F, Fut>(
        runtime: &Handle,
        name: &'static str,
        period: Duration,
        token: CancellationToken,
        mut body: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = runtime.spawn(async move {
            info!(task = name, period_ms = period.as_millis() as u64, "Starting recurring task");

            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;

                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                body().await;
            }

            debug!(task = name, "Recurring task stopped");
        });

        Self {
            name,
            period,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub(crate) fn abort_handle(&self) -> AbortHandle {
        self.handle.abort_handle()
    }

    pub(crate) fn into_join_handle(self) -> JoinHandle<()> {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn counting_task(
        period: Duration,
        token: CancellationToken,
        body_time: Duration,
    ) -> (RecurringTask, Arc<AtomicU64>) {
        let count = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&count);
        let task = RecurringTask::spawn(&Handle::current(), "test", period, token, move || {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(body_time).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (task, count)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let token = CancellationToken::new();
        let (task, count) = counting_task(Duration::from_secs(1), token.clone(), Duration::ZERO);
        assert_eq!(task.name(), "test");
        assert_eq!(task.period(), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        token.cancel();
        task.into_join_handle().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let token = CancellationToken::new();
        let (task, count) = counting_task(Duration::from_secs(1), token.clone(), Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        token.cancel();
        task.into_join_handle().await.unwrap();
        let seen = count.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(seen, 1);
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_body_finishes_before_cancel_takes_effect() {
        let token = CancellationToken::new();
        let (task, count) =
            counting_task(Duration::from_secs(1), token.clone(), Duration::from_secs(2));

        // Tick at 1s is mid-body at 1.5s; the body still completes.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        token.cancel();
        task.into_join_handle().await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrunning_body_skips_missed_ticks() {
        let token = CancellationToken::new();
        let (task, count) = counting_task(
            Duration::from_secs(1),
            token.clone(),
            Duration::from_millis(2500),
        );

        // Bodies start at 1s, 3.5s and 6s: one overdue tick fires at once, the
        // rest of the backlog is dropped instead of bursting.
        tokio::time::sleep(Duration::from_millis(6600)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        token.cancel();
        task.into_join_handle().await.unwrap();
    }
}
