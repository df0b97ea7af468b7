use std::{io, mem};

use libc::{CLOCK_MONOTONIC, timespec};

use crate::Ticks;
use crate::pal::TickSource;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Nanosecond ticks from `CLOCK_MONOTONIC`.
///
/// We use the precise clock rather than `CLOCK_MONOTONIC_COARSE` because timed regions
/// are often only a few microseconds long and the coarse clock would round them to zero.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TickSourceImpl;

impl TickSourceImpl {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl TickSource for TickSourceImpl {
    #[expect(
        clippy::cast_sign_loss,
        clippy::arithmetic_side_effects,
        reason = "never going to happen with timestamps within real-universe ranges"
    )]
    #[inline]
    fn now_ticks(&self) -> Ticks {
        // SAFETY: All-zero is a valid initial value for this type.
        let mut ts: timespec = unsafe { mem::zeroed() };

        // SAFETY: We are passing valid arguments, no other safety requirements.
        let result = unsafe { libc::clock_gettime(CLOCK_MONOTONIC, &raw mut ts) };

        assert!(result == 0, "{}", io::Error::last_os_error());

        ts.tv_sec as u64 * NANOS_PER_SECOND + ts.tv_nsec as u64
    }

    fn ticks_per_second(&self) -> u64 {
        NANOS_PER_SECOND
    }
}
