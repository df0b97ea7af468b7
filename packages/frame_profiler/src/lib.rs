#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! # frame_profiler
//!
//! Always-on timing of named scopes and accumulation of named counters for frame-based
//! real-time applications such as games and simulations.
//!
//! The profiler is designed to stay enabled in shipping builds: recording a timed region costs
//! two clock reads and a handful of atomic operations, never allocates and never blocks. All
//! storage is reserved up front with fixed capacities; when a table fills up, further data is
//! discarded and an `is_out_of_*()` flag is raised instead of failing.
//!
//! # Concepts
//!
//! * A **scope** is a named category of work ("render", "physics"). For each scope, the total
//!   time spent in it and the number of invocations are accumulated per frame.
//! * A **sample** is one timed invocation of a scope, with its own label, start offset and
//!   duration. Samples are kept for the current frame only.
//! * A **counter** is a named `u64` that accumulates for the lifetime of the profiler.
//! * A **frame** is the interval between [`Profiler::begin()`] and [`Profiler::end()`]. The
//!   profiler tracks the duration of the last frame and the longest of the last
//!   [`ROLLING_WINDOW_FRAMES`] frames.
//!
//! # Instrumenting code
//!
//! Most applications install one process-wide profiler via [`global::initialize()`] and
//! instrument code with the [`profile_scope!`], [`counter!`] and [`counter_hash!`] macros.
//! The macros do nothing while no profiler is installed and expand to nothing at all when
//! the `disabled` crate feature is enabled.
//!
//! ```
//! use frame_profiler::{counter, global, profile_scope};
//!
//! fn update_entities(count: u64) {
//!     profile_scope!("update", "entities");
//!     counter!("entities_updated", count);
//! }
//!
//! global::initialize(64, 1024, 32).unwrap();
//!
//! global::begin().unwrap();
//! update_entities(100);
//! global::end().unwrap();
//!
//! global::finalize().unwrap();
//! ```
//!
//! # Using a profiler directly
//!
//! A [`Profiler`] can also be owned by the application and passed around explicitly. Each
//! instrumentation point owns a [`ScopeSite`] that caches the scope it registered.
//!
//! ```
//! use frame_profiler::{Profiler, Report, ScopeSite};
//!
//! static RENDER: ScopeSite = ScopeSite::new("render");
//!
//! let profiler = Profiler::builder()
//!     .max_scopes(32)
//!     .max_samples(512)
//!     .build();
//!
//! profiler.begin().unwrap();
//! {
//!     let _region = profiler.enter(&RENDER, "opaque_pass");
//!     // ... render ...
//! }
//! profiler.end().unwrap();
//!
//! println!("{}", Report::collect(&profiler));
//! ```
//!
//! # Reading the data
//!
//! After [`Profiler::end()`], the `iterate_*()` methods visit the scopes, samples and counters
//! of the completed frame, and [`Report::collect()`] captures all of it in a printable
//! snapshot. Reading must not overlap with recording threads.
//!
//! # Logging
//!
//! The profiler emits `tracing` events: a warning the first time each table runs out of
//! capacity and whenever the frame protocol is misused, plus debug events on lifecycle changes.

mod builder;
mod clock;
mod constants;
mod counter;
mod data_types;
mod error;
mod frame;
pub mod global;
mod macros;
mod pal;
mod profiler;
mod report;
mod rolling_window;
mod sample;
mod scope;
mod scope_site;
mod timed_region;

pub use builder::*;
pub use clock::*;
pub use constants::*;
pub use counter::*;
pub use data_types::*;
pub use error::*;
pub use profiler::*;
pub use report::*;
pub use sample::*;
pub use scope::*;
pub use scope_site::*;
pub use timed_region::*;
