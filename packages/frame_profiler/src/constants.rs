pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock - profiler state may be inconsistent";

/// Number of most recent completed frames that the rolling maximum frame time covers.
pub const ROLLING_WINDOW_FRAMES: usize = 60;

pub(crate) const DEFAULT_MAX_SCOPES: usize = 256;
pub(crate) const DEFAULT_MAX_SAMPLES: usize = 16 * 1024;
pub(crate) const DEFAULT_MAX_COUNTERS: usize = 128;
