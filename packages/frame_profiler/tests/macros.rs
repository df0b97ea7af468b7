//! The instrumentation macros recording into the process-wide profiler.
//!
//! The process-wide profiler is shared by every test in a test binary, so the whole
//! scenario runs in a single test function.

#![cfg(not(feature = "disabled"))]

use std::sync::LazyLock;

use frame_profiler::{NameHash, counter, counter_hash, global, profile_scope};

fn physics_step() {
    profile_scope!("physics", "step");
    counter!("physics_steps", 1);
}

fn render() {
    profile_scope!("render", "frame");

    for _ in 0..3 {
        profile_scope!("render", "draw");
        counter_hash!("draw_calls", *DRAW_CALLS, 1);
    }
}

static DRAW_CALLS: LazyLock<NameHash> =
    LazyLock::new(|| frame_profiler::counter_hash("draw_calls"));

fn scope_counts() -> Vec<(&'static str, u64)> {
    let current = global::current();
    let mut counts = Vec::new();

    current.get().unwrap().iterate_scopes(|scope| {
        counts.push((scope.name(), scope.count()));
    });

    counts
}

fn sample_names() -> Vec<(&'static str, &'static str)> {
    let current = global::current();
    let profiler = current.get().unwrap();
    let mut names = Vec::new();

    profiler.iterate_samples(|sample| {
        names.push((profiler.scope(sample.scope()).name(), sample.name()));
    });

    names
}

#[test]
fn macros_record_into_current_profiler() {
    // Without a profiler the macros do nothing.
    physics_step();
    render();

    global::initialize(16, 64, 8).unwrap();

    global::begin().unwrap();
    physics_step();
    physics_step();
    render();
    global::end().unwrap();

    // Two "render" call sites register two distinct scopes with the same display name.
    assert_eq!(
        scope_counts(),
        [("physics", 2), ("render", 1), ("render", 3)]
    );

    // Samples are ordered by when the region started.
    assert_eq!(
        sample_names(),
        [
            ("physics", "step"),
            ("physics", "step"),
            ("render", "frame"),
            ("render", "draw"),
            ("render", "draw"),
            ("render", "draw"),
        ]
    );

    {
        let current = global::current();
        let profiler = current.get().unwrap();
        assert_eq!(
            profiler.counter_value(frame_profiler::counter_hash("physics_steps")),
            Some(2)
        );
        assert_eq!(profiler.counter_value(*DRAW_CALLS), Some(3));
    }

    // Next frame: per-frame data is reset, counters keep accumulating.
    global::begin().unwrap();
    physics_step();
    global::end().unwrap();

    assert_eq!(
        scope_counts(),
        [("physics", 1), ("render", 0), ("render", 0)]
    );
    assert_eq!(sample_names(), [("physics", "step")]);

    {
        let current = global::current();
        let profiler = current.get().unwrap();
        assert_eq!(
            profiler.counter_value(frame_profiler::counter_hash("physics_steps")),
            Some(3)
        );
    }

    global::finalize().unwrap();

    // The call sites re-register against a new profiler.
    global::initialize(16, 64, 8).unwrap();

    global::begin().unwrap();
    render();
    global::end().unwrap();

    assert_eq!(scope_counts(), [("render", 1), ("render", 3)]);

    global::finalize().unwrap();
}
