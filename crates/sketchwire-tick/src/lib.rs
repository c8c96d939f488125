//! Local countdown ticker for Sketchwire.
//!
//! The server sends a phase countdown only now and then. Between those
//! updates the client counts down on its own so the on-screen timer moves
//! smoothly: seeded with `D` milliseconds, the ticker emits `D`, `D - 100`,
//! `D - 200`, ... every 100 ms and stops after the last value that is still
//! `>= 0`.
//!
//! # Ownership and cancellation
//!
//! The ticker is a plain struct, not a task. It is owned by the client's
//! dispatch loop and polled as one branch of its `tokio::select!`:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(msg) = messages.recv() => { /* may call ticker.start / cancel */ }
//!         tick = ticker.wait_for_tick() => { /* show tick.remaining_millis */ }
//!     }
//! }
//! ```
//!
//! Because the same loop that handles phase updates also owns the ticker,
//! [`CountdownTicker::cancel`] is synchronous: once it returns, no tick of
//! the old countdown can fire.
//!
//! # Overruns
//!
//! If the loop is busy and a deadline is missed, the ticker skips ahead:
//! the next emitted value is the one due *now*, and the cadence restarts
//! from the current instant.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the countdown ticker.
#[derive(Debug, Clone)]
pub struct CountdownConfig {
    /// Time between two emitted values, and the amount subtracted each
    /// time. Default: 100 ms.
    pub interval: Duration,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
        }
    }
}

impl CountdownConfig {
    /// Shortest interval the ticker accepts.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    /// Clamp any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`CountdownTicker::new`]. The interval is
    /// raised to [`Self::MIN_INTERVAL`] and truncated to whole
    /// milliseconds, since countdown values are whole milliseconds.
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_us = self.interval.as_micros() as u64,
                "countdown interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self.interval = Duration::from_millis(self.interval.as_millis() as u64);
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// One emitted countdown value, returned by
/// [`CountdownTicker::wait_for_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    /// Milliseconds left in the current phase. Never negative.
    pub remaining_millis: u64,
    /// How many values were skipped because the loop woke up late
    /// (0 in normal operation).
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Counts a phase timer down between server updates.
#[derive(Debug)]
pub struct CountdownTicker {
    interval: Duration,
    /// The value the next tick will emit, when running.
    remaining: Option<u64>,
    /// When the next tick is due.
    next_tick: Option<Instant>,
}

impl CountdownTicker {
    /// Creates an idle ticker.
    pub fn new(config: CountdownConfig) -> Self {
        let config = config.validated();
        Self {
            interval: config.interval,
            remaining: None,
            next_tick: None,
        }
    }

    /// Starts (or restarts) the countdown at `millis`. The first value is
    /// emitted right away. Any running countdown is replaced.
    pub fn start(&mut self, millis: u64) {
        debug!(millis, "countdown started");
        self.remaining = Some(millis);
        self.next_tick = Some(Instant::now());
    }

    /// Stops the countdown. Idempotent.
    pub fn cancel(&mut self) {
        if self.remaining.take().is_some() {
            debug!("countdown cancelled");
        }
        self.next_tick = None;
    }

    /// Whether a countdown is in progress.
    pub fn is_running(&self) -> bool {
        self.remaining.is_some()
    }

    /// The value the next tick will emit, if running.
    pub fn remaining_millis(&self) -> Option<u64> {
        self.remaining
    }

    /// The configured tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the next value is due and returns it.
    ///
    /// When idle (never started, cancelled, or finished) this future pends
    /// forever, which lets `tokio::select!` keep serving its other
    /// branches. Dropping the future before it resolves leaves the ticker
    /// unchanged.
    pub async fn wait_for_tick(&mut self) -> CountdownTick {
        let (Some(next), Some(remaining)) = (self.next_tick, self.remaining)
        else {
            return std::future::pending::<CountdownTick>().await;
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        let step = self.interval.as_millis() as u64;
        let late_by = now.saturating_duration_since(next);
        let ticks_skipped = (late_by.as_millis() as u64) / step;

        let skipped_millis = ticks_skipped.saturating_mul(step);
        let value = if skipped_millis <= remaining {
            remaining - skipped_millis
        } else {
            // Overslept past zero: emit the last value the sequence has.
            remaining % step
        };
        if ticks_skipped > 0 {
            warn!(
                skipped = ticks_skipped,
                late_ms = late_by.as_millis() as u64,
                "countdown overrun, skipping ahead"
            );
        }

        match value.checked_sub(step) {
            Some(rest) => {
                self.remaining = Some(rest);
                self.next_tick = Some(now + self.interval);
            }
            None => {
                self.remaining = None;
                self.next_tick = None;
            }
        }

        trace!(remaining_millis = value, "countdown tick");
        CountdownTick {
            remaining_millis: value,
            ticks_skipped,
        }
    }
}

impl Default for CountdownTicker {
    fn default() -> Self {
        Self::new(CountdownConfig::default())
    }
}
