use crate::{Profiler, SampleId, ScopeId, Ticks};

/// Measures one invocation of a scope, from creation until drop.
///
/// Entering the region reserves a sample and captures the start time. Dropping it - on normal
/// exit, early return, `?` propagation or unwinding - records the elapsed time in the sample
/// and adds it to the scope's accumulators with atomic operations.
///
/// Nested regions of the same scope are each counted: the scope's count is the number of
/// completed regions and its elapsed time is inclusive, so nested time is counted at every level.
///
/// Create instances via [`Profiler::enter()`] or the [`profile_scope!`][crate::profile_scope]
/// macro.
///
/// # Example
///
/// ```
/// use frame_profiler::{Profiler, ScopeSite};
///
/// static LOAD: ScopeSite = ScopeSite::new("load");
///
/// fn load(profiler: &Profiler, path: &str) -> Result<usize, String> {
///     let _region = profiler.enter(&LOAD, "load_file");
///
///     if path.is_empty() {
///         // The region is still recorded.
///         return Err("no path".to_string());
///     }
///
///     Ok(path.len())
/// }
///
/// let profiler = Profiler::new(16, 256, 8);
/// profiler.begin().unwrap();
/// load(&profiler, "").unwrap_err();
/// load(&profiler, "level1.map").unwrap();
/// profiler.end().unwrap();
///
/// profiler.iterate_scopes(|scope| assert_eq!(scope.count(), 2));
/// ```
#[derive(Debug)]
#[must_use = "the region is measured until this guard is dropped"]
pub struct TimedRegion<'a> {
    profiler: &'a Profiler,

    scope: ScopeId,
    sample: SampleId,
    name: &'static str,

    start: Ticks,
}

impl<'a> TimedRegion<'a> {
    pub(crate) fn enter(profiler: &'a Profiler, scope: ScopeId, name: &'static str) -> Self {
        let sample = profiler.allocate_sample();

        // Last, so that the reservation is not part of the measurement.
        let start = profiler.clock().now();

        Self {
            profiler,
            scope,
            sample,
            name,
            start,
        }
    }

    /// The scope this region is folded into.
    #[must_use]
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// The sample this region is recorded in.
    #[must_use]
    pub fn sample(&self) -> SampleId {
        self.sample
    }
}

impl Drop for TimedRegion<'_> {
    #[inline]
    fn drop(&mut self) {
        let end = self.profiler.clock().now();

        // 64-bit ticks do not overflow in practice. A clock that appears to go backwards
        // saturates to zero instead of wrapping to a huge duration.
        let elapsed = end.saturating_sub(self.start);

        self.profiler.record_region(
            self.scope,
            self.sample,
            self.name,
            self.start,
            elapsed,
        );
    }
}
