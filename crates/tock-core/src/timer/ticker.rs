//! Tick sources for driving a [`SessionEngine`](super::SessionEngine).
//!
//! A ticker only says "one second passed". Dropping the future returned by
//! [`Ticker::tick`] cancels the pending tick, and the engine ignores ticks
//! once it has stopped, so a late tick can never touch a paused or reset
//! countdown.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub trait Ticker {
    /// Resolves when the next tick is due.
    fn tick(&mut self) -> impl Future<Output = ()>;

    /// Restart the period from now, so the next tick is a full period away.
    /// Called whenever a countdown (re)starts.
    fn reset(&mut self) {}
}

/// Real-time ticker backed by a tokio interval.
///
/// The first tick lands one full period after creation. Late ticks are
/// delayed rather than replayed in a burst.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new() -> Self {
        Self::with_period(TICK_PERIOD)
    }

    pub fn with_period(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

impl Default for IntervalTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }

    fn reset(&mut self) {
        self.interval.reset();
    }
}

/// Resolves immediately. Counts how many ticks were taken.
#[derive(Debug, Default)]
pub struct InstantTicker {
    ticks: u64,
}

impl InstantTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Ticker for InstantTicker {
    async fn tick(&mut self) {
        self.ticks += 1;
        tokio::task::yield_now().await;
    }
}
