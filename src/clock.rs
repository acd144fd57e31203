use embassy_time::{Duration, Instant};

/// Monotonic time source used for timeouts and protocol delays.
pub trait Clock {
    fn now(&mut self) -> Instant;

    fn elapsed_since(&mut self, start: Instant) -> Duration {
        self.now()
            .checked_duration_since(start)
            .unwrap_or(Duration::from_ticks(0))
    }

    /// Busy wait for `duration`.
    fn block_for(&mut self, duration: Duration) {
        let start = self.now();
        while self.elapsed_since(start) < duration {}
    }
}

/// [`Clock`] backed by the embassy time driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now(&mut self) -> Instant {
        Instant::now()
    }

    fn block_for(&mut self, duration: Duration) {
        embassy_time::block_for(duration);
    }
}
