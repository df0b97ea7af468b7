use std::sync::LazyLock;
use std::time::Instant;

use crate::Ticks;
use crate::pal::TickSource;

// All tick sources share one epoch so that ticks from different profilers are comparable.
static EPOCH: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Nanoseconds since the first use, measured with `std::time::Instant`.
///
/// Used under Miri, which cannot call into the OS clock directly, and on targets
/// without a dedicated backend.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TickSourceImpl;

impl TickSourceImpl {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl TickSource for TickSourceImpl {
    fn now_ticks(&self) -> Ticks {
        u64::try_from(EPOCH.elapsed().as_nanos()).unwrap_or(Ticks::MAX)
    }

    fn ticks_per_second(&self) -> u64 {
        1_000_000_000
    }
}
