use std::time::Instant;

/// Wall-clock frame timer. `tick()` returns the seconds elapsed since the
/// previous call, which drives animation mixers and auto-orbit timers.
pub struct Clock {
    last_tick: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
        }
    }

    /// Returns delta time in seconds since the last tick.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        delta
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-rate accumulator timer. Fires at most once per `tick()` call and
/// carries the surplus over, so a slow frame catches up on later frames
/// instead of dropping fires.
pub struct RepeatingTimer {
    interval: f32,
    accumulator: f32,
}

impl RepeatingTimer {
    /// Timer firing `hz` times per second.
    pub fn from_hz(hz: f32) -> Self {
        Self {
            interval: 1.0 / hz,
            accumulator: 0.0,
        }
    }

    pub fn tick(&mut self, delta: f32) -> bool {
        self.accumulator += delta;
        if self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_at_rate() {
        let mut timer = RepeatingTimer::from_hz(60.0);
        assert!(!timer.tick(0.008), "Half an interval should not fire");
        assert!(timer.tick(0.009), "Crossing the interval should fire");
        assert!(!timer.tick(0.0), "Surplus alone should not refire");
    }

    #[test]
    fn timer_carries_surplus_over() {
        let mut timer = RepeatingTimer::from_hz(10.0);
        // A 0.35s stall is worth three fires; they drain one per tick.
        assert!(timer.tick(0.35));
        assert!(timer.tick(0.0));
        assert!(timer.tick(0.0));
        assert!(!timer.tick(0.0));
    }

    #[test]
    fn reset_drops_accumulated_time() {
        let mut timer = RepeatingTimer::from_hz(10.0);
        timer.tick(0.09);
        timer.reset();
        assert!(!timer.tick(0.09), "Reset should forget the accumulated 0.09s");
    }

    #[test]
    fn clock_reports_nonnegative_delta() {
        let mut clock = Clock::new();
        assert!(clock.tick() >= 0.0);
    }
}
