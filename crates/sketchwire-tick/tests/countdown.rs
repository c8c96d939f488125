//! Integration tests for the countdown ticker.
//!
//! Every async test runs with `start_paused = true`: Tokio's clock only
//! moves when all tasks are idle (auto-advance) or when we call
//! `time::advance`, so the emitted values are fully deterministic.

use std::time::Duration;

use sketchwire_tick::{CountdownConfig, CountdownTick, CountdownTicker};
use tokio::time::{self, Instant};

// =========================================================================
// Helpers
// =========================================================================

/// Drains the ticker until it goes idle and returns every value emitted.
async fn collect_all(ticker: &mut CountdownTicker) -> Vec<u64> {
    let mut values = Vec::new();
    while ticker.is_running() {
        values.push(ticker.wait_for_tick().await.remaining_millis);
    }
    values
}

/// `true` if the ticker stays silent for a full second.
async fn stays_silent(ticker: &mut CountdownTicker) -> bool {
    time::timeout(Duration::from_secs(1), ticker.wait_for_tick())
        .await
        .is_err()
}

// =========================================================================
// Config
// =========================================================================

#[test]
fn test_default_interval_is_100ms() {
    assert_eq!(CountdownConfig::default().interval, Duration::from_millis(100));
}

#[test]
fn test_validated_zero_interval_clamps_to_minimum() {
    let config = CountdownConfig {
        interval: Duration::ZERO,
    }
    .validated();
    assert_eq!(config.interval, CountdownConfig::MIN_INTERVAL);
}

#[test]
fn test_new_ticker_is_idle() {
    let ticker = CountdownTicker::default();
    assert!(!ticker.is_running());
    assert_eq!(ticker.remaining_millis(), None);
}

// =========================================================================
// Counting
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_emits_multiples_down_to_zero() {
    let mut ticker = CountdownTicker::default();
    ticker.start(300);

    assert_eq!(collect_all(&mut ticker).await, vec![300, 200, 100, 0]);
    assert!(stays_silent(&mut ticker).await);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_stops_at_last_non_negative_value() {
    let mut ticker = CountdownTicker::default();
    ticker.start(250);

    assert_eq!(collect_all(&mut ticker).await, vec![250, 150, 50]);
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_is_immediate_then_every_interval() {
    let mut ticker = CountdownTicker::default();
    let start = Instant::now();
    ticker.start(1_000);

    ticker.wait_for_tick().await;
    assert!(start.elapsed() < Duration::from_millis(1));

    ticker.wait_for_tick().await;
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_millis(101));
}

#[tokio::test(start_paused = true)]
async fn test_countdown_is_monotonically_non_increasing() {
    let mut ticker = CountdownTicker::default();
    ticker.start(2_000);

    let values = collect_all(&mut ticker).await;
    assert!(values.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(values.len(), 21);
}

#[tokio::test(start_paused = true)]
async fn test_zero_countdown_emits_once() {
    let mut ticker = CountdownTicker::default();
    ticker.start(0);

    assert_eq!(collect_all(&mut ticker).await, vec![0]);
}

// =========================================================================
// Cancel / restart
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_silences_ticker() {
    let mut ticker = CountdownTicker::default();
    ticker.start(5_000);
    ticker.wait_for_tick().await;

    ticker.cancel();

    assert!(!ticker.is_running());
    assert!(stays_silent(&mut ticker).await);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_is_idempotent() {
    let mut ticker = CountdownTicker::default();
    ticker.cancel();
    ticker.cancel();
    assert!(stays_silent(&mut ticker).await);
}

#[tokio::test(start_paused = true)]
async fn test_restart_replaces_running_countdown() {
    let mut ticker = CountdownTicker::default();
    ticker.start(30_000);
    ticker.wait_for_tick().await;
    ticker.wait_for_tick().await;

    ticker.start(500);

    assert_eq!(collect_all(&mut ticker).await, vec![500, 400, 300, 200, 100, 0]);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_wait_leaves_state_unchanged() {
    let mut ticker = CountdownTicker::default();
    ticker.start(1_000);
    ticker.wait_for_tick().await;

    // Give up on the next tick before it is due.
    let result =
        time::timeout(Duration::from_millis(50), ticker.wait_for_tick()).await;
    assert!(result.is_err());

    assert_eq!(ticker.remaining_millis(), Some(900));
    assert_eq!(ticker.wait_for_tick().await.remaining_millis, 900);
}

// =========================================================================
// Overrun
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_overrun_skips_ahead() {
    let mut ticker = CountdownTicker::default();
    ticker.start(1_000);
    ticker.wait_for_tick().await; // 1000 at t=0

    // The loop was busy: next deadline (t=100) missed by 250 ms.
    time::advance(Duration::from_millis(350)).await;

    let tick = ticker.wait_for_tick().await;
    assert_eq!(
        tick,
        CountdownTick {
            remaining_millis: 700,
            ticks_skipped: 2,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_overrun_past_zero_emits_final_value() {
    let mut ticker = CountdownTicker::default();
    ticker.start(250);
    ticker.wait_for_tick().await; // 250

    time::advance(Duration::from_secs(5)).await;

    let tick = ticker.wait_for_tick().await;
    assert_eq!(tick.remaining_millis, 50);
    assert!(!ticker.is_running());
}
