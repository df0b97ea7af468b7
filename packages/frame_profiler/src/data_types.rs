/// A point in time or a duration, expressed in ticks of the profiler clock.
///
/// Use [`Clock::ticks_per_second()`][crate::Clock::ticks_per_second] to convert to seconds.
pub type Ticks = u64;

/// The value accumulated by a counter.
pub type CounterValue = u64;

/// Precomputed hash of a counter name, as returned by [`counter_hash()`][crate::counter_hash].
pub type NameHash = u32;
