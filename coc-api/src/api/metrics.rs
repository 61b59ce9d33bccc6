use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use tracing::info;

const LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Cheap request counters shared by every endpoint wrapper of one client.
#[derive(Debug)]
pub struct RequestMetrics {
    start: Instant,
    count: AtomicU64,
    failures: AtomicU64,
    name: &'static str,
}

impl RequestMetrics {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            count: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            name,
        })
    }

    /// Count one request attempt.
    pub fn inc(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one failed request, transport errors and non 200 statuses.
    pub fn inc_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Periodically log a usage summary until the task is dropped.
    pub async fn log_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(LOG_INTERVAL);
        // The first tick fires immediately, skip it.
        interval.tick().await;

        loop {
            interval.tick().await;
            self.log_metrics();
        }
    }

    fn log_metrics(&self) {
        let elapsed_min = self.start.elapsed().as_secs_f64() / 60.0;
        let count = self.count();
        let average = if elapsed_min > 0.0 {
            count as f64 / elapsed_min
        } else {
            0.0
        };
        info!(
            "📊 [{}] {} request(s) sent, {} failed, {:.2} req/min average",
            self.name,
            count,
            self.failures(),
            average
        );
    }
}
