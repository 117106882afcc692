use std::time::{Duration, Instant};

/// Monotonic millisecond clock anchored at construction.
///
/// Readings are `f64` milliseconds since the anchor, matching the units of
/// browser `performance.now()` so native and web hosts report comparable
/// timestamps.
#[derive(Debug, Copy, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }

    /// Milliseconds elapsed since the anchor.
    pub fn now_ms(&self) -> f64 {
        self.ms_at(Instant::now())
    }

    /// Converts an `Instant` into this clock's millisecond scale.
    ///
    /// Instants before the anchor saturate to zero.
    pub fn ms_at(&self, instant: Instant) -> f64 {
        instant.saturating_duration_since(self.origin).as_secs_f64() * 1000.0
    }

    /// Converts a millisecond reading back into an `Instant`.
    ///
    /// Negative readings map to the anchor.
    pub fn instant_at(&self, ms: f64) -> Instant {
        self.origin + Duration::from_secs_f64(ms.max(0.0) / 1000.0)
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_never_decrease() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(a >= 0.0);
        assert!(b >= a);
    }

    #[test]
    fn instant_round_trips_through_ms() {
        let clock = MonotonicClock::new();
        let at = clock.instant_at(250.0);
        assert!((clock.ms_at(at) - 250.0).abs() < 1e-6);
    }

    #[test]
    fn negative_readings_clamp_to_origin() {
        let clock = MonotonicClock::new();
        assert_eq!(clock.ms_at(clock.instant_at(-5.0)), 0.0);
    }
}
