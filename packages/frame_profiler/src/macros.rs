/// Measures the rest of the enclosing block as a region of the process-wide profiler.
///
/// `scope_name` names the scope, which is registered once per macro invocation site.
/// `name` labels this invocation in the sample buffer. Both must be `&'static str`.
///
/// Does nothing if no process-wide profiler is installed, or if the crate is compiled
/// with the `disabled` feature.
///
/// # Example
///
/// ```
/// use frame_profiler::{global, profile_scope};
///
/// fn update_physics() {
///     profile_scope!("physics", "update");
///     // ... everything until the end of the function is measured ...
/// }
///
/// global::initialize(16, 256, 8).unwrap();
/// global::begin().unwrap();
/// update_physics();
/// global::end().unwrap();
/// global::finalize().unwrap();
/// ```
#[cfg(not(feature = "disabled"))]
#[macro_export]
macro_rules! profile_scope {
    ($scope_name:expr, $name:expr) => {
        let __frame_profiler_current = $crate::global::current();
        let _frame_profiler_region = __frame_profiler_current.get().map(|profiler| {
            profiler.enter(
                {
                    static SITE: $crate::ScopeSite = $crate::ScopeSite::new($scope_name);
                    &SITE
                },
                $name,
            )
        });
    };
}

/// Adds `amount` to the counter `name` of the process-wide profiler.
///
/// Hashes the name on every call. Prefer [`counter_hash!`] on hot paths.
///
/// # Example
///
/// ```
/// use frame_profiler::counter;
///
/// counter!("bytes_sent", 1500);
/// ```
#[cfg(not(feature = "disabled"))]
#[macro_export]
macro_rules! counter {
    ($name:expr, $amount:expr) => {
        $crate::global::add_counter($name, $amount)
    };
}

/// Adds `amount` to the counter `name` of the process-wide profiler, identified by a
/// hash previously computed with [`counter_hash()`][crate::counter_hash()].
///
/// # Example
///
/// ```
/// use std::sync::LazyLock;
///
/// use frame_profiler::{NameHash, counter_hash};
///
/// static PARTICLES: LazyLock<NameHash> = LazyLock::new(|| counter_hash("particles"));
///
/// for _ in 0..100 {
///     counter_hash!("particles", *PARTICLES, 1);
/// }
/// ```
#[cfg(not(feature = "disabled"))]
#[macro_export]
macro_rules! counter_hash {
    ($name:expr, $name_hash:expr, $amount:expr) => {
        $crate::global::add_counter_hash($name, $name_hash, $amount)
    };
}

// With the `disabled` feature, instrumentation compiles to nothing and arguments
// are not evaluated.

/// Instrumentation is disabled: expands to nothing.
#[cfg(feature = "disabled")]
#[macro_export]
macro_rules! profile_scope {
    ($scope_name:expr, $name:expr) => {};
}

/// Instrumentation is disabled: expands to nothing.
#[cfg(feature = "disabled")]
#[macro_export]
macro_rules! counter {
    ($name:expr, $amount:expr) => {
        ()
    };
}

/// Instrumentation is disabled: expands to nothing.
#[cfg(feature = "disabled")]
#[macro_export]
macro_rules! counter_hash {
    ($name:expr, $name_hash:expr, $amount:expr) => {
        ()
    };
}
