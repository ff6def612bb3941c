//! Fixed-interval pacing between outbound query batches.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Something that can wait for a duration
#[async_trait]
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested waits and returns immediately
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits requested so far, in order
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
    }
}

/// Spaces successive ticks by a fixed interval.
///
/// The first tick returns at once; every later tick waits the full interval.
#[derive(Debug)]
pub struct IntervalScheduler {
    interval: Duration,
    sleeper: Arc<dyn Sleeper>,
    ticks: usize,
}

impl IntervalScheduler {
    pub fn new(interval: Duration, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            interval,
            sleeper,
            ticks: 0,
        }
    }

    /// Wait for the next slot
    pub async fn tick(&mut self) {
        if self.ticks > 0 && !self.interval.is_zero() {
            tracing::debug!("Pacing next query by {:?}", self.interval);
            self.sleeper.sleep(self.interval).await;
        }
        self.ticks += 1;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
