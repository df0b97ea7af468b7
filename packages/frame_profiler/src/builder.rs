use crate::{
    Clock, DEFAULT_MAX_COUNTERS, DEFAULT_MAX_SAMPLES, DEFAULT_MAX_SCOPES, Profiler,
};

/// Creates instances of [`Profiler`].
///
/// All capacities are optional. Zero is a valid capacity: the corresponding table is
/// permanently exhausted and silently discards everything recorded into it.
///
/// Use `Profiler::builder()` to create a new instance of this builder.
///
/// # Example
///
/// ```
/// use frame_profiler::Profiler;
///
/// let profiler = Profiler::builder()
///     .max_scopes(64)
///     .max_samples(4096)
///     .max_counters(32)
///     .build();
///
/// assert_eq!(profiler.max_scopes(), 64);
/// ```
#[derive(Debug)]
#[must_use]
pub struct ProfilerBuilder {
    max_scopes: usize,
    max_samples: usize,
    max_counters: usize,
}

impl ProfilerBuilder {
    pub(crate) fn new() -> Self {
        Self {
            max_scopes: DEFAULT_MAX_SCOPES,
            max_samples: DEFAULT_MAX_SAMPLES,
            max_counters: DEFAULT_MAX_COUNTERS,
        }
    }

    /// Sets how many distinct call sites can be registered over the lifetime of the profiler.
    ///
    /// Defaults to 256.
    pub fn max_scopes(self, max_scopes: usize) -> Self {
        Self { max_scopes, ..self }
    }

    /// Sets how many timed regions can be recorded per frame.
    ///
    /// Defaults to 16384.
    pub fn max_samples(self, max_samples: usize) -> Self {
        Self {
            max_samples,
            ..self
        }
    }

    /// Sets how many distinct counters can be created over the lifetime of the profiler.
    ///
    /// Defaults to 128.
    pub fn max_counters(self, max_counters: usize) -> Self {
        Self {
            max_counters,
            ..self
        }
    }

    /// Allocates all tables and creates the profiler.
    ///
    /// This is the only point at which the profiler allocates memory for its tables.
    #[must_use]
    pub fn build(self) -> Profiler {
        self.build_with_clock(Clock::new())
    }

    pub(crate) fn build_with_clock(self, clock: Clock) -> Profiler {
        Profiler::from_parts(clock, self.max_scopes, self.max_samples, self.max_counters)
    }
}
