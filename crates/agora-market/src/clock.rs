//! Revaluation-grid arithmetic and the periodic scheduler.
//!
//! The market revalues on a fixed wall-clock grid (every N minutes,
//! anchored to the absolute epoch, not to process start). The scheduler is
//! a background task that fires the handler at each grid instant, honors a
//! persisted future `next_update_at` on cold start, and stops cleanly on a
//! shutdown signal without losing the computed next instant.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

/// Scheduler errors surfaced by the tick handler.
#[derive(Debug, Error)]
pub enum ClockError {
    #[error("Revaluation tick failed: {0}")]
    Tick(String),
}

/// Round `now` up to the next strict multiple of `interval` on the epoch
/// grid. An already-aligned instant yields the following grid step, so the
/// result is always strictly in the future.
pub fn next_grid_instant(now: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    let step_ms = interval.num_milliseconds().max(1);
    let next_ms = (now.timestamp_millis().div_euclid(step_ms) + 1) * step_ms;
    DateTime::from_timestamp_millis(next_ms).unwrap_or(now + interval)
}

/// One revaluation cycle, implemented by the trading service.
///
/// Splitting the trait from the timer keeps the cycle directly invokable
/// in tests without wall-clock waiting.
pub trait RevaluationHandler: Send + Sync {
    /// Revalue the full instrument set and persist it; returns the next
    /// scheduled grid instant.
    fn on_tick(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ClockError>;

    /// Persisted `next_update_at`, if any, for cold-start continuity.
    fn scheduled_next(&self) -> Option<DateTime<Utc>>;
}

/// Background task driving periodic revaluation.
pub struct RevaluationScheduler<H: RevaluationHandler> {
    handler: Arc<H>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl<H: RevaluationHandler> RevaluationScheduler<H> {
    pub fn new(handler: Arc<H>, interval: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            handler,
            interval,
            shutdown,
        }
    }

    /// First instant to fire at: a persisted future `next_update_at` wins
    /// (restart continuity); a persisted past instant fires immediately
    /// (missed tick); otherwise the next grid step.
    fn first_deadline(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.handler.scheduled_next() {
            Some(at) if at > now => at,
            Some(_) => now,
            None => next_grid_instant(now, self.interval),
        }
    }

    /// Run until the shutdown channel flips to true.
    pub async fn run(mut self) {
        let mut deadline = self.first_deadline(Utc::now());
        info!(next = %deadline, interval_min = self.interval.num_minutes(), "Revaluation scheduler started");

        loop {
            let wait = (deadline - Utc::now())
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    let now = Utc::now();
                    match self.handler.on_tick(now) {
                        Ok(next) => deadline = next,
                        Err(e) => {
                            // Keep the grid cadence; the next tick retries.
                            warn!(error = %e, "Revaluation tick failed");
                            deadline = next_grid_instant(now, self.interval);
                        }
                    }
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!(next = %deadline, "Revaluation scheduler stopped");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use parking_lot::Mutex;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, h, m, s).unwrap()
    }

    #[test]
    fn test_rounds_up_to_grid() {
        let interval = Duration::minutes(10);
        assert_eq!(next_grid_instant(at(9, 3, 27), interval), at(9, 10, 0));
        assert_eq!(next_grid_instant(at(9, 59, 59), interval), at(10, 0, 0));
    }

    #[test]
    fn test_aligned_instant_advances_one_step() {
        let interval = Duration::minutes(10);
        let aligned = at(9, 10, 0);
        let next = next_grid_instant(aligned, interval);
        assert_eq!(next, at(9, 20, 0));
        // Idempotence: aligned instant plus one grid step.
        assert_eq!(next_grid_instant(next, interval), next + interval);
    }

    #[test]
    fn test_always_strictly_future() {
        let interval = Duration::minutes(10);
        for offset_s in [0, 1, 59, 299, 599] {
            let now = at(9, 0, 0) + Duration::seconds(offset_s);
            assert!(next_grid_instant(now, interval) > now);
        }
    }

    struct RecordingHandler {
        persisted_next: Option<DateTime<Utc>>,
        ticks: Mutex<Vec<DateTime<Utc>>>,
    }

    impl RevaluationHandler for RecordingHandler {
        fn on_tick(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ClockError> {
            self.ticks.lock().push(now);
            Ok(next_grid_instant(now, Duration::minutes(10)))
        }

        fn scheduled_next(&self) -> Option<DateTime<Utc>> {
            self.persisted_next
        }
    }

    #[test]
    fn test_cold_start_honors_persisted_future_instant() {
        let stored = Utc::now() + Duration::minutes(3);
        let handler = RecordingHandler {
            persisted_next: Some(stored),
            ticks: Mutex::new(Vec::new()),
        };
        let (_tx, rx) = watch::channel(false);
        let scheduler = RevaluationScheduler::new(Arc::new(handler), Duration::minutes(10), rx);

        // Exactly the stored instant: not now, not a full interval later.
        assert_eq!(scheduler.first_deadline(Utc::now()), stored);
    }

    #[test]
    fn test_cold_start_with_stale_instant_fires_immediately() {
        let handler = RecordingHandler {
            persisted_next: Some(Utc::now() - Duration::minutes(25)),
            ticks: Mutex::new(Vec::new()),
        };
        let (_tx, rx) = watch::channel(false);
        let scheduler = RevaluationScheduler::new(Arc::new(handler), Duration::minutes(10), rx);

        let now = Utc::now();
        assert!(scheduler.first_deadline(now) <= now);
    }

    #[tokio::test]
    async fn test_shutdown_stops_scheduler() {
        let handler = Arc::new(RecordingHandler {
            persisted_next: Some(Utc::now() + Duration::hours(1)),
            ticks: Mutex::new(Vec::new()),
        });
        let (tx, rx) = watch::channel(false);
        let scheduler = RevaluationScheduler::new(handler.clone(), Duration::minutes(10), rx);

        let task = tokio::spawn(scheduler.run());
        tx.send(true).unwrap();
        task.await.unwrap();

        assert!(handler.ticks.lock().is_empty());
    }
}
