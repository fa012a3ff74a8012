//! Sampling-loop pacing.
//!
//! The main loop sleeps `LOOP_DELAY_S` between cycles on a [`WakeSignal`].
//! A validated settings change wakes the signal so the new interval or
//! threshold takes effect immediately instead of after the old delay
//! expires. No in-flight network operation is cancelled by a wake; its
//! completion is applied whenever it arrives.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::app::ports::SamplerControl;

/// Why a [`WakeSignal::wait_timeout`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// The full delay elapsed.
    TimedOut,
    /// Someone called [`WakeSignal::wake`]; re-read the settings.
    Woken,
}

/// Condvar-backed wakeable sleep shared between the sampling loop and the
/// settings handler.
#[derive(Clone)]
pub struct WakeSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    /// Cancel the current (or next) wait.
    pub fn wake(&self) {
        let (pending, condvar) = &*self.inner;
        *pending.lock() = true;
        condvar.notify_all();
    }

    /// Sleep up to `timeout`, returning early if woken. A wake issued
    /// before the wait starts is not lost.
    pub fn wait_timeout(&self, timeout: Duration) -> WakeReason {
        let (pending, condvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut flag = pending.lock();
        loop {
            if *flag {
                *flag = false;
                return WakeReason::Woken;
            }
            if condvar.wait_until(&mut flag, deadline).timed_out() {
                return WakeReason::TimedOut;
            }
        }
    }
}

impl Default for WakeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplerControl for WakeSignal {
    fn wake(&mut self) {
        WakeSignal::wake(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_times_out_when_not_woken() {
        let signal = WakeSignal::new();
        let started = Instant::now();
        let reason = signal.wait_timeout(Duration::from_millis(30));
        assert_eq!(reason, WakeReason::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn wake_before_wait_is_not_lost() {
        let signal = WakeSignal::new();
        signal.wake();
        let started = Instant::now();
        let reason = signal.wait_timeout(Duration::from_secs(5));
        assert_eq!(reason, WakeReason::Woken);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn wake_from_another_thread_interrupts_wait() {
        let signal = WakeSignal::new();
        let waker = signal.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            waker.wake();
        });
        let reason = signal.wait_timeout(Duration::from_secs(10));
        handle.join().unwrap();
        assert_eq!(reason, WakeReason::Woken);
    }

    #[test]
    fn wake_flag_is_consumed_by_one_wait() {
        let signal = WakeSignal::new();
        signal.wake();
        assert_eq!(signal.wait_timeout(Duration::from_millis(1)), WakeReason::Woken);
        assert_eq!(
            signal.wait_timeout(Duration::from_millis(1)),
            WakeReason::TimedOut
        );
    }
}
