//! Lifecycle of the process-wide profiler.
//!
//! The process-wide profiler is shared by every test in a test binary, so the whole
//! lifecycle is exercised by a single test function.

use frame_profiler::{Error, Profiler, global};

#[test]
fn initialize_finalize_lifecycle() {
    // Nothing is installed yet.
    assert!(!global::is_initialized());
    assert!(global::current().get().is_none());
    assert_eq!(global::begin(), Err(Error::NotInitialized));
    assert_eq!(global::end(), Err(Error::NotInitialized));
    assert_eq!(global::finalize(), Err(Error::NotInitialized));

    // Counters are silently dropped while nothing is installed.
    global::add_counter("ignored", 1);

    global::initialize(8, 64, 4).unwrap();
    assert!(global::is_initialized());
    assert_eq!(
        global::initialize(8, 64, 4),
        Err(Error::AlreadyInitialized)
    );

    {
        let current = global::current();
        let profiler = current.get().unwrap();
        assert_eq!(profiler.max_scopes(), 8);
        assert_eq!(profiler.max_samples(), 64);
        assert_eq!(profiler.max_counters(), 4);
        assert_eq!(profiler.frame_index(), 0);
    }

    global::begin().unwrap();
    assert_eq!(global::begin(), Err(Error::FrameAlreadyStarted));
    global::add_counter("requests", 2);
    global::end().unwrap();
    assert_eq!(global::end(), Err(Error::NoFrameInProgress));

    {
        let current = global::current();
        let profiler = current.get().unwrap();
        assert_eq!(profiler.frame_index(), 1);
        assert!(!profiler.is_in_frame());
        assert_eq!(
            profiler.counter_value(frame_profiler::counter_hash("requests")),
            Some(2)
        );
        assert_eq!(
            profiler.counter_value(frame_profiler::counter_hash("ignored")),
            None
        );
    }

    // A handle taken before finalization keeps the old profiler alive.
    let stale = global::current();

    global::finalize().unwrap();
    assert!(!global::is_initialized());
    assert_eq!(global::finalize(), Err(Error::NotInitialized));
    assert_eq!(stale.get().unwrap().frame_index(), 1);
    drop(stale);

    // A custom profiler can be installed after finalization.
    global::install(Profiler::builder().max_counters(2).build()).unwrap();
    assert_eq!(
        global::install(Profiler::new(1, 1, 1)),
        Err(Error::AlreadyInitialized)
    );

    {
        let current = global::current();
        let profiler = current.get().unwrap();
        assert_eq!(profiler.max_counters(), 2);
        // Counters do not carry over between profilers.
        assert_eq!(
            profiler.counter_value(frame_profiler::counter_hash("requests")),
            None
        );
    }

    global::finalize().unwrap();
}
