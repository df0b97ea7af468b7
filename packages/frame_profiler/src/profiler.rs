use std::sync::atomic::{AtomicU32, Ordering};

use crate::counter::CounterRegistry;
use crate::frame::FrameController;
use crate::sample::SampleBuffer;
use crate::scope::ScopeRegistry;
use crate::scope_site::UNCACHED_INSTANCE;
use crate::{
    Clock, Counter, CounterValue, NameHash, ProfilerBuilder, Result, Sample, SampleId, Scope,
    ScopeId, ScopeSite, Ticks, TimedRegion, counter_hash,
};

/// Distinguishes profiler instances so that call-site caches can tell them apart.
/// Starts at 1 because 0 marks a call site that was never resolved.
static NEXT_INSTANCE_ID: AtomicU32 = AtomicU32::new(1);

/// Hands out the next instance ID from `next`. Never repeats an ID: once the range is used
/// up, every further profiler gets [`UNCACHED_INSTANCE`], which call sites never cache.
fn next_instance_id(next: &AtomicU32) -> u32 {
    next.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
        .unwrap_or(UNCACHED_INSTANCE)
}

/// Measures time spent in named scopes per frame and accumulates named counters.
///
/// All tables have a fixed capacity chosen at creation time. Recording timings and counters
/// never allocates, never blocks and never fails: when a table is full, further entries are
/// discarded and the corresponding `is_out_of_*()` flag is raised.
///
/// # Frame protocol
///
/// The frame driver calls [`begin()`][Self::begin] at the start of each frame and
/// [`end()`][Self::end] at its end, strictly alternating. In between, any number of threads
/// may record timed regions and counters. Scope timings and samples describe the current
/// frame only; counters accumulate for the lifetime of the profiler.
///
/// # Reading the data
///
/// The `iterate_*()` methods must not run concurrently with writers. Call them after
/// [`end()`][Self::end] and before the next [`begin()`][Self::begin], or otherwise make
/// sure no thread is recording at the same time. Violating this does not cause undefined
/// behavior but may yield torn or missing records.
///
/// # Example
///
/// ```
/// use frame_profiler::{Profiler, ScopeSite};
///
/// static UPDATE: ScopeSite = ScopeSite::new("update");
///
/// let profiler = Profiler::new(16, 256, 8);
///
/// profiler.begin().unwrap();
/// {
///     let _region = profiler.enter(&UPDATE, "entities");
///     profiler.add_counter("entities_updated", 42);
/// }
/// profiler.end().unwrap();
///
/// profiler.iterate_scopes(|scope| {
///     println!("{}: {} calls, {} ticks", scope.name(), scope.count(), scope.elapsed());
/// });
/// println!("frame took {} s", profiler.frame_time());
/// ```
#[derive(Debug)]
pub struct Profiler {
    instance_id: u32,
    clock: Clock,

    scopes: ScopeRegistry,
    samples: SampleBuffer,
    counters: CounterRegistry,
    frame: FrameController,
}

impl Profiler {
    /// Creates a new profiler builder with the default configuration.
    pub fn builder() -> ProfilerBuilder {
        ProfilerBuilder::new()
    }

    /// Creates a profiler with the given table capacities.
    #[must_use]
    pub fn new(max_scopes: usize, max_samples: usize, max_counters: usize) -> Self {
        Self::builder()
            .max_scopes(max_scopes)
            .max_samples(max_samples)
            .max_counters(max_counters)
            .build()
    }

    pub(crate) fn from_parts(
        clock: Clock,
        max_scopes: usize,
        max_samples: usize,
        max_counters: usize,
    ) -> Self {
        let instance_id = next_instance_id(&NEXT_INSTANCE_ID);

        let profiler = Self {
            instance_id,
            clock,
            scopes: ScopeRegistry::new(max_scopes),
            samples: SampleBuffer::new(max_samples),
            counters: CounterRegistry::new(max_counters),
            frame: FrameController::new(),
        };

        tracing::debug!(
            instance_id,
            max_scopes = profiler.max_scopes(),
            max_samples = profiler.max_samples(),
            max_counters = profiler.max_counters(),
            ticks_per_second = profiler.ticks_per_second(),
            "profiler created"
        );

        profiler
    }

    /// Starts a new frame.
    ///
    /// Zeroes the elapsed time and count of every scope and discards all samples of the
    /// previous frame. Counters are not affected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameAlreadyStarted`][crate::Error::FrameAlreadyStarted] if a frame is
    /// already in progress. The call has no other effect in that case.
    pub fn begin(&self) -> Result<()> {
        let frame = self.frame.begin(self.clock.now())?;

        self.scopes.reset_accumulators();
        self.samples.reset(frame);

        Ok(())
    }

    /// Ends the current frame, updating the frame time and the rolling maximum.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFrameInProgress`][crate::Error::NoFrameInProgress] if there is no
    /// frame to end. The call has no other effect in that case.
    pub fn end(&self) -> Result<()> {
        self.frame.end(self.clock.now()).map(|_| ())
    }

    /// Registers a new scope and returns its handle.
    ///
    /// Every call registers a new scope, even if the name was used before. Prefer
    /// [`ScopeSite`], which calls this once per call site and caches the result.
    ///
    /// If the registry is full, returns [`ScopeId::OVERFLOW`], which can be used like
    /// any other handle but is never reported.
    pub fn allocate_scope(&self, name: &'static str) -> ScopeId {
        self.scopes.allocate(name)
    }

    /// Resolves a scope handle.
    #[must_use]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        self.scopes.get(id)
    }

    /// Reserves a sample slot in the current frame for the calling thread.
    ///
    /// If the buffer is full, returns a shared overflow slot that is never reported.
    /// Usually called via [`enter()`][Self::enter] rather than directly.
    #[inline]
    pub fn allocate_sample(&self) -> SampleId {
        self.samples.allocate()
    }

    /// Starts measuring a region belonging to the scope of `site`.
    ///
    /// `name` labels this particular invocation in the sample buffer. The region ends
    /// when the returned guard is dropped.
    #[inline]
    pub fn enter(&self, site: &ScopeSite, name: &'static str) -> TimedRegion<'_> {
        TimedRegion::enter(self, site.resolve(self), name)
    }

    /// Starts measuring a region belonging to an already resolved scope.
    #[inline]
    pub fn enter_scope(&self, scope: ScopeId, name: &'static str) -> TimedRegion<'_> {
        TimedRegion::enter(self, scope, name)
    }

    /// Adds `amount` to the counter called `name`, creating it on first use.
    ///
    /// Hashes the name on every call. On hot paths, use
    /// [`add_counter_hash()`][Self::add_counter_hash] with a cached hash instead.
    pub fn add_counter(&self, name: &'static str, amount: CounterValue) {
        self.counters.add(name, counter_hash(name), amount);
    }

    /// Adds `amount` to the counter identified by a precomputed [`counter_hash()`],
    /// creating it as `name` on first use.
    ///
    /// Once the counter exists this is a lock-free lookup followed by an atomic add.
    /// Creating it takes a lock, so warm up counters used on highly concurrent hot paths.
    #[inline]
    pub fn add_counter_hash(&self, name: &'static str, name_hash: NameHash, amount: CounterValue) {
        self.counters.add(name, name_hash, amount);
    }

    /// The current value of a counter, if it exists.
    #[must_use]
    pub fn counter_value(&self, name_hash: NameHash) -> Option<CounterValue> {
        self.counters.find(name_hash).map(Counter::value)
    }

    /// The clock used for all measurements.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// How many ticks make up one second.
    #[must_use]
    pub fn ticks_per_second(&self) -> u64 {
        self.clock.ticks_per_second()
    }

    /// Duration of the most recently completed frame, in seconds. 0 before the first frame ends.
    #[must_use]
    pub fn frame_time(&self) -> f64 {
        self.clock.ticks_to_seconds(self.frame.last_frame())
    }

    /// Longest frame among the last 60 completed frames, in seconds.
    #[must_use]
    pub fn max_frame_time(&self) -> f64 {
        self.clock.ticks_to_seconds(self.frame.max_frame())
    }

    /// Duration of the most recently completed frame, in ticks.
    #[must_use]
    pub fn frame_ticks(&self) -> Ticks {
        self.frame.last_frame()
    }

    /// Longest frame among the last 60 completed frames, in ticks.
    #[must_use]
    pub fn max_frame_ticks(&self) -> Ticks {
        self.frame.max_frame()
    }

    /// Whether `begin()` has been called without a matching `end()` yet.
    #[must_use]
    pub fn is_in_frame(&self) -> bool {
        self.frame.is_in_frame()
    }

    /// Number of the current (or most recently completed) frame, starting from 1.
    /// 0 before the first frame begins.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame.frame_index()
    }

    /// Whether a scope could not be registered because the registry was full. Sticky.
    #[must_use]
    pub fn is_out_of_scopes(&self) -> bool {
        self.scopes.is_out_of_scopes()
    }

    /// Whether a sample was discarded because the buffer was full. Sticky.
    #[must_use]
    pub fn is_out_of_samples(&self) -> bool {
        self.samples.is_out_of_samples()
    }

    /// Whether a counter could not be created because the registry was full. Sticky.
    #[must_use]
    pub fn is_out_of_counters(&self) -> bool {
        self.counters.is_out_of_counters()
    }

    /// The scope capacity.
    #[must_use]
    pub fn max_scopes(&self) -> usize {
        self.scopes.capacity()
    }

    /// The per-frame sample capacity.
    #[must_use]
    pub fn max_samples(&self) -> usize {
        self.samples.capacity()
    }

    /// The counter capacity.
    #[must_use]
    pub fn max_counters(&self) -> usize {
        self.counters.capacity()
    }

    /// Calls `visitor` once for every registered scope, in registration order.
    ///
    /// Must not run concurrently with threads that record timed regions.
    pub fn iterate_scopes(&self, mut visitor: impl FnMut(&Scope)) {
        for scope in self.scopes.published() {
            visitor(scope);
        }
    }

    /// Calls `visitor` once for every completed sample of the current frame, in reservation order.
    ///
    /// Must not run concurrently with threads that record timed regions.
    pub fn iterate_samples(&self, mut visitor: impl FnMut(&Sample)) {
        for sample in self.samples.current() {
            visitor(&sample);
        }
    }

    /// Calls `visitor` once for every counter, in creation order.
    ///
    /// Must not run concurrently with threads that create counters.
    pub fn iterate_counters(&self, mut visitor: impl FnMut(&Counter)) {
        for counter in self.counters.published() {
            visitor(counter);
        }
    }

    pub(crate) fn instance_id(&self) -> u32 {
        self.instance_id
    }

    /// Looks up or registers the scope of the call site at address `site`.
    pub(crate) fn resolve_site(&self, site: usize, name: &'static str) -> ScopeId {
        self.scopes.resolve_site(site, name)
    }

    #[inline]
    pub(crate) fn record_region(
        &self,
        scope: ScopeId,
        sample: SampleId,
        name: &'static str,
        start: Ticks,
        elapsed: Ticks,
    ) {
        let start_in_frame = start.saturating_sub(self.frame.frame_start());

        self.samples
            .write(sample, name, scope, start_in_frame, elapsed);
        self.scopes.get(scope).record(elapsed);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::iter;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;
    use std::sync::atomic::AtomicU64;
    use std::thread;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::pal::{MockTickSource, TickSourceFacade};
    use crate::{Error, ROLLING_WINDOW_FRAMES};

    assert_impl_all!(Profiler: Send, Sync);

    fn profiler_with_ticks<F>(
        ticks_per_second: u64,
        now: F,
        max_scopes: usize,
        max_samples: usize,
        max_counters: usize,
    ) -> Profiler
    where
        F: Fn() -> Ticks + Send + 'static,
    {
        let mut source = MockTickSource::new();
        source
            .expect_ticks_per_second()
            .return_const(ticks_per_second);
        source.expect_now_ticks().returning(now);

        Profiler::builder()
            .max_scopes(max_scopes)
            .max_samples(max_samples)
            .max_counters(max_counters)
            .build_with_clock(Clock::from_source(TickSourceFacade::from_mock(source)))
    }

    /// A clock that only moves when the test says so.
    fn manual_profiler(ticks_per_second: u64, max_samples: usize) -> (Profiler, Arc<AtomicU64>) {
        let time = Arc::new(AtomicU64::new(0));

        let profiler = profiler_with_ticks(
            ticks_per_second,
            {
                let time = Arc::clone(&time);
                move || time.load(Ordering::Relaxed)
            },
            16,
            max_samples,
            16,
        );

        (profiler, time)
    }

    fn advance(time: &AtomicU64, ticks: Ticks) {
        time.fetch_add(ticks, Ordering::Relaxed);
    }

    fn sample_count(profiler: &Profiler) -> usize {
        let mut count = 0;
        profiler.iterate_samples(|_| count += 1);
        count
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Too slow under Miri.
    fn regions_from_many_threads_aggregate_exactly() {
        const THREADS: usize = 8;
        const REGIONS_PER_THREAD: u64 = 500;
        const ELAPSED: Ticks = 7;

        thread_local! {
            static CALLS: Cell<u64> = const { Cell::new(0) };
        }

        // Each thread sees its own clock advancing by ELAPSED per reading, so every
        // region (two consecutive readings on one thread) takes exactly ELAPSED ticks.
        let profiler = profiler_with_ticks(
            1_000,
            || {
                CALLS.with(|calls| {
                    let n = calls.get();
                    calls.set(n + 1);
                    n * ELAPSED
                })
            },
            4,
            THREADS * REGIONS_PER_THREAD as usize,
            4,
        );
        let site = ScopeSite::new("shared");

        profiler.begin().unwrap();

        thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..REGIONS_PER_THREAD {
                        let _region = profiler.enter(&site, "work");
                    }
                });
            }
        });

        profiler.end().unwrap();

        let scope = profiler.scope(site.resolve(&profiler));
        let total = THREADS as u64 * REGIONS_PER_THREAD;

        assert_eq!(scope.count(), total);
        assert_eq!(scope.elapsed(), total * ELAPSED);
        assert_eq!(sample_count(&profiler), THREADS * REGIONS_PER_THREAD as usize);
        assert!(!profiler.is_out_of_samples());

        profiler.iterate_samples(|sample| {
            assert_eq!(sample.elapsed(), ELAPSED);
            assert_eq!(sample.name(), "work");
            assert_eq!(sample.scope(), scope.id());
        });
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Too slow under Miri.
    fn counter_increments_from_many_threads_sum_exactly() {
        const THREADS: usize = 8;
        const INCREMENTS_PER_THREAD: u64 = 10_000;
        const AMOUNT: CounterValue = 3;

        let profiler = Profiler::new(4, 4, 4);
        let hash = counter_hash("hot_counter");

        thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..INCREMENTS_PER_THREAD {
                        profiler.add_counter_hash("hot_counter", hash, AMOUNT);
                    }
                });
            }
        });

        assert_eq!(
            profiler.counter_value(hash),
            Some(THREADS as u64 * INCREMENTS_PER_THREAD * AMOUNT)
        );
    }

    #[test]
    fn frame_time_is_elapsed_ticks_over_rate() {
        let (profiler, time) = manual_profiler(1_000, 64);

        advance(&time, 5_000);
        profiler.begin().unwrap();
        advance(&time, 16);
        profiler.end().unwrap();

        assert_eq!(profiler.frame_ticks(), 16);
        assert!((profiler.frame_time() - 0.016).abs() < 1.0 / 1_000.0);
        assert!((profiler.max_frame_time() - 0.016).abs() < 1.0 / 1_000.0);
    }

    #[test]
    fn max_frame_time_covers_last_sixty_frames() {
        // Two ticks per unit so that the half-unit frame is representable.
        let (profiler, time) = manual_profiler(2, 64);

        let durations = (1..=ROLLING_WINDOW_FRAMES as Ticks)
            .map(|units| units * 2)
            .chain(iter::once(1));

        for duration in durations {
            profiler.begin().unwrap();
            advance(&time, duration);
            profiler.end().unwrap();
        }

        // The first frame (1 unit) rolled out; the maximum is frame 60 with 60 units.
        assert_eq!(profiler.max_frame_ticks(), 120);
        assert!((profiler.max_frame_time() - 60.0).abs() < f64::EPSILON);
        assert!((profiler.frame_time() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn max_frame_time_before_window_fills() {
        let (profiler, time) = manual_profiler(1, 64);

        for duration in [4, 9, 2] {
            profiler.begin().unwrap();
            advance(&time, duration);
            profiler.end().unwrap();
        }

        assert_eq!(profiler.max_frame_ticks(), 9);
        assert_eq!(profiler.frame_ticks(), 2);
    }

    #[test]
    fn scope_capacity_boundary() {
        const CAPACITY: usize = 3;

        let profiler = Profiler::new(CAPACITY, 16, 4);
        let sites = [
            ScopeSite::new("a"),
            ScopeSite::new("b"),
            ScopeSite::new("c"),
            ScopeSite::new("d"),
        ];

        profiler.begin().unwrap();

        for site in sites.iter().take(CAPACITY) {
            drop(profiler.enter(site, "fits"));
        }
        assert!(!profiler.is_out_of_scopes());

        drop(profiler.enter(&sites[CAPACITY], "spills"));
        assert!(profiler.is_out_of_scopes());

        profiler.end().unwrap();

        let mut seen = Vec::new();
        profiler.iterate_scopes(|scope| seen.push((scope.name(), scope.index(), scope.count())));

        assert_eq!(seen, [("a", 0, 1), ("b", 1, 1), ("c", 2, 1)]);
    }

    #[test]
    fn begin_discards_samples_of_previous_frame() {
        let profiler = Profiler::new(4, 16, 4);
        let site = ScopeSite::new("per_frame");

        profiler.begin().unwrap();
        drop(profiler.enter(&site, "one"));
        drop(profiler.enter(&site, "two"));
        profiler.end().unwrap();

        assert_eq!(sample_count(&profiler), 2);
        assert_eq!(profiler.scope(site.resolve(&profiler)).count(), 2);

        profiler.begin().unwrap();

        assert_eq!(sample_count(&profiler), 0);
        assert_eq!(profiler.scope(site.resolve(&profiler)).count(), 0);
        assert_eq!(profiler.scope(site.resolve(&profiler)).elapsed(), 0);
    }

    #[test]
    fn counters_persist_across_frames() {
        let profiler = Profiler::new(4, 16, 4);

        profiler.begin().unwrap();
        profiler.add_counter("persistent", 5);
        profiler.end().unwrap();

        profiler.begin().unwrap();
        profiler.add_counter("persistent", 7);
        profiler.end().unwrap();

        assert_eq!(profiler.counter_value(counter_hash("persistent")), Some(12));

        let mut seen = Vec::new();
        profiler.iterate_counters(|counter| seen.push((counter.name(), counter.value())));
        assert_eq!(seen, [("persistent", 12)]);
    }

    #[test]
    fn sample_start_is_relative_to_frame_start() {
        let (profiler, time) = manual_profiler(1_000, 64);
        let site = ScopeSite::new("offset");

        advance(&time, 1_000);
        profiler.begin().unwrap();

        advance(&time, 10);
        {
            let _region = profiler.enter(&site, "late");
            advance(&time, 4);
        }

        profiler.end().unwrap();

        let mut samples = Vec::new();
        profiler.iterate_samples(|sample| samples.push(*sample));

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].start(), 10);
        assert_eq!(samples[0].elapsed(), 4);
        assert_eq!(profiler.scope(site.resolve(&profiler)).elapsed(), 4);
    }

    #[test]
    fn nested_regions_of_same_scope_are_each_counted() {
        let (profiler, time) = manual_profiler(1_000, 64);
        let site = ScopeSite::new("recursive");

        profiler.begin().unwrap();
        {
            let _outer = profiler.enter(&site, "outer");
            advance(&time, 2);
            {
                let _inner = profiler.enter(&site, "inner");
                advance(&time, 3);
            }
        }
        profiler.end().unwrap();

        let scope = profiler.scope(site.resolve(&profiler));
        assert_eq!(scope.count(), 2);
        // Inclusive: 5 for the outer region plus 3 for the inner one.
        assert_eq!(scope.elapsed(), 8);
    }

    #[test]
    fn region_is_recorded_on_unwind() {
        let (profiler, time) = manual_profiler(1_000, 64);
        let site = ScopeSite::new("panicky");

        profiler.begin().unwrap();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _region = profiler.enter(&site, "boom");
            advance(&time, 6);
            panic!("intentional");
        }));
        assert!(result.is_err());

        profiler.end().unwrap();

        let scope = profiler.scope(site.resolve(&profiler));
        assert_eq!(scope.count(), 1);
        assert_eq!(scope.elapsed(), 6);
    }

    #[test]
    fn sample_exhaustion_keeps_scope_totals() {
        let (profiler, time) = manual_profiler(1_000, 1);
        let site = ScopeSite::new("many");

        profiler.begin().unwrap();
        for _ in 0..3 {
            let _region = profiler.enter(&site, "region");
            advance(&time, 1);
        }
        profiler.end().unwrap();

        assert!(profiler.is_out_of_samples());
        assert_eq!(sample_count(&profiler), 1);

        // Scope accumulation does not depend on having a sample slot.
        let scope = profiler.scope(site.resolve(&profiler));
        assert_eq!(scope.count(), 3);
        assert_eq!(scope.elapsed(), 3);
    }

    #[test]
    fn frame_protocol_misuse_is_reported() {
        let profiler = Profiler::new(4, 4, 4);

        assert_eq!(profiler.end(), Err(Error::NoFrameInProgress));

        profiler.begin().unwrap();
        assert_eq!(profiler.begin(), Err(Error::FrameAlreadyStarted));
        assert_eq!(profiler.frame_index(), 1);
        assert!(profiler.is_in_frame());

        profiler.end().unwrap();
        assert!(!profiler.is_in_frame());
        assert_eq!(profiler.end(), Err(Error::NoFrameInProgress));
    }

    #[test]
    fn counter_exhaustion_is_flagged() {
        let profiler = Profiler::new(4, 4, 1);

        profiler.add_counter("first", 1);
        assert!(!profiler.is_out_of_counters());

        profiler.add_counter("second", 1);
        assert!(profiler.is_out_of_counters());
        assert_eq!(profiler.counter_value(counter_hash("second")), None);
        assert_eq!(profiler.counter_value(counter_hash("first")), Some(1));
    }

    #[test]
    fn instances_get_distinct_ids() {
        let a = Profiler::new(1, 1, 1);
        let b = Profiler::new(1, 1, 1);

        assert_ne!(a.instance_id(), b.instance_id());
        assert_ne!(a.instance_id(), 0);
    }

    #[test]
    fn instance_ids_are_never_reused_after_running_out() {
        let next = AtomicU32::new(u32::MAX - 1);

        assert_eq!(next_instance_id(&next), u32::MAX - 1);
        assert_eq!(next_instance_id(&next), UNCACHED_INSTANCE);
        assert_eq!(next_instance_id(&next), UNCACHED_INSTANCE);
    }

    #[test]
    fn uncached_instances_still_resolve_sites_consistently() {
        let mut a = Profiler::new(4, 4, 4);
        let mut b = Profiler::new(4, 4, 4);
        a.instance_id = UNCACHED_INSTANCE;
        b.instance_id = UNCACHED_INSTANCE;

        let site = ScopeSite::new("uncached");
        // Burn one slot in `b` so the two profilers assign different indexes.
        b.allocate_scope("other");

        for _ in 0..3 {
            assert_eq!(site.resolve(&a).as_raw(), 0);
            assert_eq!(site.resolve(&b).as_raw(), 1);
        }

        let mut scopes = 0;
        a.iterate_scopes(|_| scopes += 1);
        assert_eq!(scopes, 1);
    }
}
