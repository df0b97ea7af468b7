//! The process-wide profiler used by the instrumentation macros.
//!
//! The host application brackets its lifetime with [`initialize()`] (or [`install()`]) and
//! [`finalize()`]. The frame loop calls [`begin()`] and [`end()`]. Instrumented code anywhere
//! in the process uses [`profile_scope!`][crate::profile_scope], [`counter!`][crate::counter]
//! and [`counter_hash!`][crate::counter_hash], which do nothing while no profiler is installed.
//!
//! # Example
//!
//! ```
//! use frame_profiler::{global, profile_scope};
//!
//! global::initialize(64, 1024, 32).unwrap();
//!
//! for _ in 0..3 {
//!     global::begin().unwrap();
//!     {
//!         profile_scope!("game", "tick");
//!         // ... run the frame ...
//!     }
//!     global::end().unwrap();
//! }
//!
//! if let Some(profiler) = global::current().get() {
//!     println!("last frame: {} s", profiler.frame_time());
//! }
//!
//! global::finalize().unwrap();
//! ```

use std::fmt::{self, Debug};
use std::sync::Arc;

use arc_swap::{ArcSwapOption, Guard};

use crate::{CounterValue, Error, NameHash, Profiler, Result};

static CURRENT: ArcSwapOption<Profiler> = ArcSwapOption::const_empty();

/// Creates a profiler with the given capacities and installs it as the process-wide profiler.
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] if a process-wide profiler is already installed.
pub fn initialize(max_scopes: usize, max_samples: usize, max_counters: usize) -> Result<()> {
    install(Profiler::new(max_scopes, max_samples, max_counters))
}

/// Installs an already configured profiler as the process-wide profiler.
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] if a process-wide profiler is already installed.
pub fn install(profiler: Profiler) -> Result<()> {
    let instance_id = profiler.instance_id();

    let previous = CURRENT.compare_and_swap(&None::<Arc<Profiler>>, Some(Arc::new(profiler)));

    if previous.is_some() {
        return Err(Error::AlreadyInitialized);
    }

    tracing::debug!(instance_id, "process-wide profiler installed");

    Ok(())
}

/// Removes the process-wide profiler.
///
/// Timed regions that are still open keep the profiler alive until they end; their results
/// are discarded along with it. Instrumentation that runs afterwards does nothing.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] if no process-wide profiler is installed.
pub fn finalize() -> Result<()> {
    let profiler = CURRENT.swap(None).ok_or(Error::NotInitialized)?;

    tracing::debug!(
        instance_id = profiler.instance_id(),
        "process-wide profiler finalized"
    );

    Ok(())
}

/// Starts a frame on the process-wide profiler. See [`Profiler::begin()`].
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] if no process-wide profiler is installed, or
/// [`Error::FrameAlreadyStarted`] if a frame is already in progress.
pub fn begin() -> Result<()> {
    current().get().ok_or(Error::NotInitialized)?.begin()
}

/// Ends the frame on the process-wide profiler. See [`Profiler::end()`].
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] if no process-wide profiler is installed, or
/// [`Error::NoFrameInProgress`] if there is no frame to end.
pub fn end() -> Result<()> {
    current().get().ok_or(Error::NotInitialized)?.end()
}

/// Adds to a counter of the process-wide profiler, if one is installed.
/// See [`Profiler::add_counter()`].
pub fn add_counter(name: &'static str, amount: CounterValue) {
    if let Some(profiler) = current().get() {
        profiler.add_counter(name, amount);
    }
}

/// Adds to a counter of the process-wide profiler via a precomputed hash, if one is installed.
/// See [`Profiler::add_counter_hash()`].
#[inline]
pub fn add_counter_hash(name: &'static str, name_hash: NameHash, amount: CounterValue) {
    if let Some(profiler) = current().get() {
        profiler.add_counter_hash(name, name_hash, amount);
    }
}

/// Whether a process-wide profiler is installed.
#[must_use]
pub fn is_initialized() -> bool {
    current().get().is_some()
}

/// Borrows the process-wide profiler, if one is installed.
///
/// Cheap enough to call on every instrumented region. The returned handle keeps the
/// profiler alive even if it is finalized in the meantime.
#[inline]
pub fn current() -> CurrentProfiler {
    CurrentProfiler {
        inner: CURRENT.load(),
    }
}

/// A borrowed handle to the process-wide profiler, as returned by [`current()`].
#[must_use]
pub struct CurrentProfiler {
    inner: Guard<Option<Arc<Profiler>>>,
}

impl CurrentProfiler {
    /// The profiler, or `None` if none was installed when the handle was taken.
    #[must_use]
    #[inline]
    pub fn get(&self) -> Option<&Profiler> {
        self.inner.as_deref()
    }
}

#[cfg_attr(test, mutants::skip)] // No API contract to test.
impl Debug for CurrentProfiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentProfiler")
            .field("profiler", &self.get())
            .finish()
    }
}
