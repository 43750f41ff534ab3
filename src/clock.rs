//! Time sources for the control loop
//!
//! The controller never calls `std::thread::sleep` or `Instant::now`
//! directly; it goes through a [`Clock`] so the same code runs against wall
//! time on the host and against simulated time in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic millisecond clock with a blocking sleep
pub trait Clock {
    /// Milliseconds since the clock was created
    fn now_ms(&self) -> u64;

    /// Block the caller for `duration`
    fn sleep(&self, duration: Duration);
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall-clock time since creation
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Create a new clock starting now
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time in seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Simulated time: only moves when somebody sleeps or advances it
///
/// Shared through an `Arc` so fakes and the input path see the same time
/// as the controller.
#[derive(Debug, Default)]
pub struct SimClock {
    now_ms: AtomicU64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at an arbitrary time
    pub fn starting_at(ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(ms),
        }
    }

    /// Move time forward without anyone sleeping
    pub fn advance(&self, duration: Duration) {
        self.now_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
