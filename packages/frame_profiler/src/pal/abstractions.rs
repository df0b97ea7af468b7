use std::fmt::Debug;

use crate::Ticks;

/// A monotonic source of ticks.
///
/// Shared by every thread that records timings, so reading it only requires `&self`.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait TickSource: Debug + Send + Sync {
    /// The current value of the monotonic clock. Never decreases.
    fn now_ticks(&self) -> Ticks;

    /// How many ticks make up one second. Constant for the lifetime of the tick source.
    fn ticks_per_second(&self) -> u64;
}
