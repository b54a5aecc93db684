//! Blocking millisecond delays.
//!
//! The LCD protocol here never reads the busy flag, so every transfer is followed by a fixed wait
//! instead. The waits go through [Delay] so tests can record them instead of sleeping.
use std::fmt::Debug;
use std::thread::sleep;
use std::time::Duration;

pub trait Delay: Debug {
    /// Blocks for at least `ms` milliseconds.
    fn wait_milliseconds(&self, ms: u32);
}

/// A [Delay] that puts the current thread to sleep.
#[derive(Debug, Default, Copy, Clone)]
pub struct SleepDelay;

impl Delay for SleepDelay {
    fn wait_milliseconds(&self, ms: u32) {
        sleep(Duration::from_millis(ms as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn sleep_delay_waits_at_least_the_requested_time() {
        let start = Instant::now();
        SleepDelay.wait_milliseconds(5);
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
