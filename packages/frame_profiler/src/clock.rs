use crate::Ticks;
use crate::pal::{TickSource, TickSourceFacade};

/// A monotonic clock that measures time in ticks.
///
/// The tick length depends on the platform: nanoseconds on Unix and the performance counter
/// period on Windows. Use [`ticks_per_second()`][Self::ticks_per_second] to normalize.
///
/// # Example
///
/// ```
/// use frame_profiler::Clock;
///
/// let clock = Clock::new();
///
/// let start = clock.now();
/// std::thread::sleep(std::time::Duration::from_millis(1));
/// let elapsed = clock.now().saturating_sub(start);
///
/// println!("slept for {} seconds", clock.ticks_to_seconds(elapsed));
/// ```
#[derive(Clone, Debug)]
pub struct Clock {
    inner: TickSourceFacade,
    ticks_per_second: u64,
}

impl Clock {
    /// Creates a clock backed by the monotonic time source of the build target platform.
    #[must_use]
    pub fn new() -> Self {
        Self::from_source(TickSourceFacade::real())
    }

    #[must_use]
    pub(crate) fn from_source(inner: TickSourceFacade) -> Self {
        Self {
            // A zero rate would make every conversion divide by zero.
            ticks_per_second: inner.ticks_per_second().max(1),
            inner,
        }
    }

    /// The current tick count. Never decreases.
    #[must_use]
    #[inline]
    pub fn now(&self) -> Ticks {
        self.inner.now_ticks()
    }

    /// How many ticks make up one second.
    #[must_use]
    #[inline]
    pub fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }

    /// Converts a tick count to seconds.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "sub-tick precision is lost only for durations beyond 2^53 ticks"
    )]
    pub fn ticks_to_seconds(&self, ticks: Ticks) -> f64 {
        ticks as f64 / self.ticks_per_second as f64
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::pal::MockTickSource;

    fn mock_clock(ticks_per_second: u64, now: Ticks) -> Clock {
        let mut source = MockTickSource::new();
        source
            .expect_ticks_per_second()
            .return_const(ticks_per_second);
        source.expect_now_ticks().return_const(now);

        Clock::from_source(TickSourceFacade::from_mock(source))
    }

    #[test]
    fn converts_ticks_to_seconds() {
        let clock = mock_clock(1000, 0);

        assert!((clock.ticks_to_seconds(1500) - 1.5).abs() < f64::EPSILON);
        assert!(clock.ticks_to_seconds(0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_rate_is_clamped() {
        let clock = mock_clock(0, 0);

        assert_eq!(clock.ticks_per_second(), 1);
    }

    #[test]
    fn now_comes_from_tick_source() {
        let clock = mock_clock(1000, 12345);

        assert_eq!(clock.now(), 12345);
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Too slow under Miri.
    fn real_clock_is_monotonic() {
        let clock = Clock::new();

        let mut previous = clock.now();

        for _ in 0..1000 {
            let current = clock.now();
            assert!(current >= previous);
            previous = current;
        }
    }
}
