use windows::Win32::System::Performance::{QueryPerformanceCounter, QueryPerformanceFrequency};

use crate::Ticks;
use crate::pal::TickSource;

/// Performance counter ticks. The frequency is fixed at boot, so we query it only once.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TickSourceImpl {
    frequency: u64,
}

impl TickSourceImpl {
    pub(crate) fn new() -> Self {
        let mut frequency: i64 = 0;

        // SAFETY: We are passing a valid pointer to a local, no other safety requirements.
        // The call cannot fail on any Windows version we support.
        let result = unsafe { QueryPerformanceFrequency(&raw mut frequency) };
        assert!(result.is_ok(), "QueryPerformanceFrequency failed: {result:?}");

        Self {
            // Never zero or negative on a functioning system; 1 keeps division safe regardless.
            frequency: u64::try_from(frequency).unwrap_or(1).max(1),
        }
    }
}

impl TickSource for TickSourceImpl {
    #[inline]
    fn now_ticks(&self) -> Ticks {
        let mut counter: i64 = 0;

        // SAFETY: We are passing a valid pointer to a local, no other safety requirements.
        let result = unsafe { QueryPerformanceCounter(&raw mut counter) };

        // Cannot fail if QueryPerformanceFrequency succeeded.
        debug_assert!(result.is_ok(), "QueryPerformanceCounter failed: {result:?}");

        u64::try_from(counter).unwrap_or_default()
    }

    fn ticks_per_second(&self) -> u64 {
        self.frequency
    }
}
