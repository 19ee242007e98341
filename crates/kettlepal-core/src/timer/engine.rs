//! Session timer.
//!
//! Counts whole seconds while running. Unlike a wall-clock engine polled by
//! the caller, the timer owns a recurring one-second Tokio task; that task is
//! aborted on `stop()`, `reset()` and drop, so no tick outlives its timer.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Idle (value kept) -> Running ...
//!           reset() from either state -> Idle, 0
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::error::ComposeError;
use crate::events::Event;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
}

#[derive(Debug, Default)]
pub struct SessionTimer {
    elapsed: Arc<AtomicU64>,
    ticker: Option<JoinHandle<()>>,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        if self.ticker.is_some() {
            TimerState::Running
        } else {
            TimerState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == TimerState::Running
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin (or resume) ticking. Already running -> `Ok(None)`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) -> Result<Option<Event>, ComposeError> {
        if self.ticker.is_some() {
            return Ok(None);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ComposeError::NoRuntime)?;
        let elapsed = Arc::clone(&self.elapsed);
        self.ticker = Some(runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK, TICK);
            loop {
                interval.tick().await;
                elapsed.fetch_add(1, Ordering::Relaxed);
            }
        }));
        tracing::debug!(elapsed = self.elapsed_seconds(), "session timer started");
        Ok(Some(Event::TimerStarted {
            elapsed_seconds: self.elapsed_seconds(),
            at: Utc::now(),
        }))
    }

    /// Pause, keeping the value. Not running -> `None`.
    pub fn stop(&mut self) -> Option<Event> {
        let ticker = self.ticker.take()?;
        ticker.abort();
        tracing::debug!(elapsed = self.elapsed_seconds(), "session timer stopped");
        Some(Event::TimerStopped {
            elapsed_seconds: self.elapsed_seconds(),
            at: Utc::now(),
        })
    }

    /// Stop ticking and go back to zero.
    pub fn reset(&mut self) -> Event {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        self.elapsed.store(0, Ordering::Relaxed);
        Event::TimerReset { at: Utc::now() }
    }

    /// Overwrite the elapsed value; a running timer keeps ticking from it.
    pub fn set_elapsed(&mut self, seconds: u64) -> Event {
        self.elapsed.store(seconds, Ordering::Relaxed);
        Event::TimerAdjusted {
            elapsed_seconds: seconds,
            at: Utc::now(),
        }
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn counts_whole_seconds() {
        let mut timer = SessionTimer::new();
        assert!(timer.start().unwrap().is_some());
        assert_eq!(timer.state(), TimerState::Running);

        sleep(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        timer.stop();

        let n = timer.elapsed_seconds();
        assert!((4..=6).contains(&n), "elapsed {n}");
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_does_not_double_rate() {
        let mut timer = SessionTimer::new();
        timer.start().unwrap();
        assert!(timer.start().unwrap().is_none());

        sleep(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        timer.stop();

        assert!(timer.elapsed_seconds() <= 4);
        assert!(timer.elapsed_seconds() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_value_and_resume_continues() {
        let mut timer = SessionTimer::new();
        timer.start().unwrap();
        sleep(Duration::from_millis(2500)).await;
        timer.stop();
        let frozen = timer.elapsed_seconds();

        sleep(Duration::from_secs(10)).await;
        assert_eq!(timer.elapsed_seconds(), frozen);

        timer.start().unwrap();
        sleep(Duration::from_millis(1500)).await;
        timer.stop();
        assert_eq!(timer.elapsed_seconds(), frozen + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_ticking() {
        let mut timer = SessionTimer::new();
        timer.set_elapsed(42);
        timer.start().unwrap();
        timer.reset();
        assert_eq!(timer.state(), TimerState::Idle);
        sleep(Duration::from_secs(3)).await;
        assert_eq!(timer.elapsed_seconds(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_tick_task() {
        let mut timer = SessionTimer::new();
        timer.start().unwrap();
        let counter = Arc::clone(&timer.elapsed);
        drop(timer);
        sleep(Duration::from_secs(3)).await;
        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn start_outside_runtime_is_an_error() {
        let mut timer = SessionTimer::new();
        assert_eq!(timer.start(), Err(ComposeError::NoRuntime));
        assert!(timer.stop().is_none());
    }
}
