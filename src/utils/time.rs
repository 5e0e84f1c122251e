use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source.
///
/// Returned durations are measured from an arbitrary, fixed origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a host can keep one handle and
/// give another to the engine.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.nanos
            .fetch_add(by.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn advance_secs(&self, secs: f32) {
        self.advance(Duration::from_secs_f32(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

/// Restartable stopwatch over a [`Clock`].
pub struct Timer {
    clock: Box<dyn Clock>,
    start_time: Duration,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(Box::new(SystemClock::new()))
    }
}

impl Timer {
    /// Creates a timer that starts counting now.
    #[must_use]
    pub fn new(clock: Box<dyn Clock>) -> Self {
        let start_time = clock.now();
        Self { clock, start_time }
    }

    /// Time since creation or the last [`restart`](Self::restart).
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.start_time)
    }

    /// Resets the start point and returns the time that had elapsed.
    pub fn restart(&mut self) -> Duration {
        let now = self.clock.now();
        let elapsed = now.saturating_sub(self.start_time);
        self.start_time = now;
        elapsed
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(250));
    }

    #[test]
    fn timer_restart_resets_elapsed() {
        let clock = ManualClock::new();
        let mut timer = Timer::new(Box::new(clock.clone()));

        clock.advance_secs(0.75);
        assert!((timer.elapsed_seconds() - 0.75).abs() < 1e-6);

        let before = timer.restart();
        assert!((before.as_secs_f32() - 0.75).abs() < 1e-6);
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }
}
