//! Coarse monotonic-ish clock, refreshed by a background task.
//!
//! The cache consults time on every `put` and every `get` (to compute and
//! test expiration deadlines). A direct syscall per access would dominate
//! the cost of those operations, so a background task keeps a cached
//! nanosecond timestamp that readers load with a single atomic load — no
//! lock, no syscall on the hot path. This is scoped to one instance per
//! [`crate::Cache`] rather than a process-wide singleton: a host that does
//! not want a process-level clock only pays for one extra background task
//! per cache it constructs.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Wall-clock resync interval. Between resyncs the clock advances itself
/// by fixed-size jumps rather than calling into the OS.
const RESYNC_INTERVAL: Duration = Duration::from_secs(1);
/// Size and count of the atomic catch-up jumps applied between resyncs.
const JITTER_STEP: Duration = Duration::from_millis(100);
const JITTER_STEPS: u32 = 10;

fn unix_nanos_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}

/// A shared, lock-free nanosecond clock.
///
/// `Clock` is cheap to clone (an `Arc` around one atomic cell) and is safe
/// to read concurrently from any number of shards. Dropping every clone
/// of the handle returned by [`Clock::start`] stops the background task.
pub struct Clock {
    now: AtomicI64,
}

impl Clock {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(unix_nanos_now()),
        })
    }

    /// Returns the cached timestamp, in nanoseconds since the Unix epoch.
    ///
    /// Guarantees: monotonic non-decreasing in practice, may drift up to
    /// ~100ms behind wall time within a calibration window, and is
    /// re-aligned with the system clock every second.
    pub fn now(&self) -> i64 {
        self.now.load(Ordering::Relaxed)
    }

    fn advance(&self, delta: i64) {
        self.now.fetch_add(delta, Ordering::Relaxed);
    }

    fn resync(&self) {
        self.now.store(unix_nanos_now(), Ordering::Relaxed);
    }
}

/// A running clock plus the means to stop its background task.
pub struct ClockHandle {
    clock: Arc<Clock>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ClockHandle {
    /// Returns a cheaply-clonable reference to the underlying clock.
    pub fn clock(&self) -> Arc<Clock> {
        self.clock.clone()
    }

    /// Stops the background refresh task. Safe to call more than once.
    pub fn stop(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Starts the background clock-refresh task.
///
/// Once per second the stored timestamp is resynced against the system
/// clock; between resyncs it is advanced by 100ms every 100ms, ten times,
/// via atomic add, so readers never take a syscall on the hot path.
pub fn start() -> ClockHandle {
    let clock = Clock::new();
    let token = CancellationToken::new();

    let task_clock = clock.clone();
    let task_token = token.clone();
    let task = tokio::task::spawn(async move {
        loop {
            for _ in 0..JITTER_STEPS {
                tokio::select! {
                    _ = tokio::time::sleep(JITTER_STEP) => {
                        task_clock.advance(JITTER_STEP.as_nanos() as i64);
                    }
                    _ = task_token.cancelled() => return,
                }
            }
            task_clock.resync();
        }
    });

    ClockHandle {
        clock,
        token,
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_close_to_wall_clock_at_construction() {
        let clock = Clock::new();
        let delta = (unix_nanos_now() - clock.now()).abs();
        assert!(delta < Duration::from_secs(1).as_nanos() as i64);
    }

    #[test]
    fn advance_moves_the_clock_forward() {
        let clock = Clock::new();
        let before = clock.now();
        clock.advance(Duration::from_millis(100).as_nanos() as i64);
        assert_eq!(clock.now(), before + Duration::from_millis(100).as_nanos() as i64);
    }

    #[tokio::test]
    async fn background_task_advances_time_without_syscalls_between_resyncs() {
        let mut handle = start();
        let clock = handle.clock();
        let t0 = clock.now();
        tokio::time::sleep(Duration::from_millis(250)).await;
        let t1 = clock.now();
        assert!(t1 > t0, "clock should have advanced");
        handle.stop();
    }
}
