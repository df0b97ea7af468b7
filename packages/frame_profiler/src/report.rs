use std::fmt::{self, Display};

use crate::{CounterValue, NameHash, Profiler, ROLLING_WINDOW_FRAMES, Ticks};

/// A human- and machine-readable snapshot of one frame of profiling data.
///
/// For human-readable output, use the `Display` trait implementation. This is intended
/// for writing to a terminal and uses only the basic ASCII character set.
///
/// For machine-readable output, inspect report contents via the provided methods.
///
/// # Example
///
/// ```
/// use frame_profiler::{Profiler, Report, ScopeSite};
///
/// static RENDER: ScopeSite = ScopeSite::new("render");
///
/// let profiler = Profiler::new(16, 256, 8);
///
/// profiler.begin().unwrap();
/// drop(profiler.enter(&RENDER, "draw"));
/// profiler.add_counter("draw_calls", 12);
/// profiler.end().unwrap();
///
/// let report = Report::collect(&profiler);
/// println!("{report}");
///
/// assert_eq!(report.scopes().count(), 1);
/// ```
#[derive(Debug)]
pub struct Report {
    frame_index: u64,
    frame_time: f64,
    max_frame_time: f64,
    ticks_per_second: u64,

    // In registration order. Only scopes that ran during the frame.
    scopes: Box<[ScopeReport]>,

    // In reservation order.
    samples: Box<[SampleReport]>,

    // In creation order.
    counters: Box<[CounterReport]>,
}

impl Report {
    /// Takes a snapshot of the profiler's current frame data.
    ///
    /// Must not run concurrently with threads that record into the profiler; typically
    /// called right after [`Profiler::end()`].
    #[must_use]
    pub fn collect(profiler: &Profiler) -> Self {
        let clock = profiler.clock();

        let mut scopes = Vec::new();
        profiler.iterate_scopes(|scope| {
            if scope.count() == 0 {
                return;
            }

            scopes.push(ScopeReport {
                name: scope.name(),
                index: scope.index(),
                elapsed: scope.elapsed(),
                elapsed_seconds: clock.ticks_to_seconds(scope.elapsed()),
                count: scope.count(),
            });
        });

        let mut samples = Vec::new();
        profiler.iterate_samples(|sample| {
            samples.push(SampleReport {
                name: sample.name(),
                scope_name: profiler.scope(sample.scope()).name(),
                start: sample.start(),
                elapsed: sample.elapsed(),
            });
        });

        let mut counters = Vec::new();
        profiler.iterate_counters(|counter| {
            counters.push(CounterReport {
                name: counter.name(),
                name_hash: counter.name_hash(),
                value: counter.value(),
            });
        });

        Self {
            frame_index: profiler.frame_index(),
            frame_time: profiler.frame_time(),
            max_frame_time: profiler.max_frame_time(),
            ticks_per_second: profiler.ticks_per_second(),
            scopes: scopes.into_boxed_slice(),
            samples: samples.into_boxed_slice(),
            counters: counters.into_boxed_slice(),
        }
    }

    /// Number of the frame the report describes.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Duration of the most recently completed frame, in seconds.
    #[must_use]
    pub fn frame_time(&self) -> f64 {
        self.frame_time
    }

    /// Longest frame among the last 60 completed frames, in seconds.
    #[must_use]
    pub fn max_frame_time(&self) -> f64 {
        self.max_frame_time
    }

    /// The tick rate that all tick values in the report are expressed in.
    #[must_use]
    pub fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }

    /// Scopes that ran at least once during the frame, in registration order.
    pub fn scopes(&self) -> impl Iterator<Item = &ScopeReport> {
        self.scopes.iter()
    }

    /// Completed samples of the frame, in the order they were started.
    pub fn samples(&self) -> impl Iterator<Item = &SampleReport> {
        self.samples.iter()
    }

    /// All counters, in creation order.
    pub fn counters(&self) -> impl Iterator<Item = &CounterReport> {
        self.counters.iter()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "frame {}: {:.3} ms (max {:.3} ms over last {ROLLING_WINDOW_FRAMES} frames)",
            self.frame_index,
            self.frame_time * 1000.0,
            self.max_frame_time * 1000.0
        )?;

        let name_width = self
            .scopes
            .iter()
            .map(|s| s.name.len())
            .chain(self.counters.iter().map(|c| c.name.len()))
            .max()
            .unwrap_or_default();

        for scope in &self.scopes {
            writeln!(
                f,
                "{:<name_width$} {:>10.3} ms {:>8} calls",
                scope.name,
                scope.elapsed_seconds * 1000.0,
                scope.count
            )?;
        }

        for counter in &self.counters {
            writeln!(f, "{:<name_width$} {:>10}", counter.name, counter.value)?;
        }

        Ok(())
    }
}

/// Per-frame totals of one scope. Part of a [`Report`].
#[derive(Clone, Debug, PartialEq)]
pub struct ScopeReport {
    name: &'static str,
    index: u32,
    elapsed: Ticks,
    elapsed_seconds: f64,
    count: u64,
}

impl ScopeReport {
    /// The display name of the scope.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The registry index of the scope.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Total ticks spent in the scope during the frame.
    #[must_use]
    pub fn elapsed(&self) -> Ticks {
        self.elapsed
    }

    /// Total seconds spent in the scope during the frame.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// Number of completed invocations during the frame.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}

/// One timed invocation. Part of a [`Report`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SampleReport {
    name: &'static str,
    scope_name: &'static str,
    start: Ticks,
    elapsed: Ticks,
}

impl SampleReport {
    /// The label of the invocation.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The display name of the scope the invocation belongs to.
    #[must_use]
    pub fn scope_name(&self) -> &'static str {
        self.scope_name
    }

    /// Start of the invocation in ticks since the start of the frame.
    #[must_use]
    pub fn start(&self) -> Ticks {
        self.start
    }

    /// Duration of the invocation in ticks.
    #[must_use]
    pub fn elapsed(&self) -> Ticks {
        self.elapsed
    }
}

/// The value of one counter. Part of a [`Report`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CounterReport {
    name: &'static str,
    name_hash: NameHash,
    value: CounterValue,
}

impl CounterReport {
    /// The display name of the counter.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The hash the counter is keyed by.
    #[must_use]
    pub fn name_hash(&self) -> NameHash {
        self.name_hash
    }

    /// The accumulated value of the counter.
    #[must_use]
    pub fn value(&self) -> CounterValue {
        self.value
    }
}
