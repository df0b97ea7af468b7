use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Profiler, ScopeId};

/// The per-call-site cache of a [`ScopeId`].
///
/// Every instrumentation point owns one `ScopeSite`, typically as a `static` generated by
/// the [`profile_scope!`][crate::profile_scope] macro. The first time the site is executed
/// against a profiler it registers a new scope; afterwards resolving it is a single atomic load.
///
/// Each profiler registers at most one scope per site, even when threads race on the first
/// invocation or the site alternates between profilers. The profiler identifies the site by
/// its address, so a site must stay in place once it has been used; a `static` always does.
///
/// The cache remembers the profiler it was last resolved against. Resolving against another
/// profiler looks the site up in that profiler's registry, which is slower but returns the
/// same scope every time.
///
/// # Example
///
/// ```
/// use frame_profiler::{Profiler, ScopeSite};
///
/// static PHYSICS_STEP: ScopeSite = ScopeSite::new("physics");
///
/// let profiler = Profiler::new(16, 256, 8);
/// profiler.begin().unwrap();
///
/// {
///     let _region = profiler.enter(&PHYSICS_STEP, "step");
///     // ... the work being measured ...
/// }
///
/// profiler.end().unwrap();
/// ```
#[derive(Debug)]
pub struct ScopeSite {
    name: &'static str,

    // High half: instance ID of the profiler the site was last resolved against
    // (0 if never resolved). Low half: raw `ScopeId`.
    state: AtomicU64,
}

impl ScopeSite {
    /// Creates an unresolved call site for a scope with the given display name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            state: AtomicU64::new(0),
        }
    }

    /// The display name of the scope this site registers.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the scope of this call site in `profiler`, registering it on first use.
    #[inline]
    pub fn resolve(&self, profiler: &Profiler) -> ScopeId {
        let instance = profiler.instance_id();
        let (cached_instance, raw) = unpack(self.state.load(Ordering::Acquire));

        if cached_instance == instance && instance != UNCACHED_INSTANCE {
            return ScopeId::from_raw(raw);
        }

        let id = profiler.resolve_site(ptr::from_ref(self).addr(), self.name);

        if instance != UNCACHED_INSTANCE {
            self.state.store(pack(instance, id.as_raw()), Ordering::Release);
        }

        id
    }
}

/// Instance ID that is never cached. Also the state of a site that was never resolved.
pub(crate) const UNCACHED_INSTANCE: u32 = 0;

fn pack(instance: u32, raw: u32) -> u64 {
    (u64::from(instance) << 32) | u64::from(raw)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "intentional - splitting the packed state into its two halves"
)]
fn unpack(state: u64) -> (u32, u32) {
    ((state >> 32) as u32, state as u32)
}
