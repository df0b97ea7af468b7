use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::{ERR_POISONED_LOCK, Ticks};

/// The display name of the shared scope that absorbs timings once the registry is full.
const OVERFLOW_SCOPE_NAME: &str = "<out of scopes>";

/// Accumulators only need to be atomic, not ordered with respect to anything else.
/// Readers are required to be synchronized with writers by the caller.
const ACCUMULATOR_ORDERING: Ordering = Ordering::Relaxed;

/// Marks a scope that was not registered on behalf of a call site.
const NO_SITE: usize = 0;

/// Identifies a [`Scope`] within the registry of one profiler.
///
/// Obtained from [`Profiler::allocate_scope()`][crate::Profiler::allocate_scope], usually
/// indirectly via a [`ScopeSite`][crate::ScopeSite].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The degenerate scope handed out when the registry is full. Timings recorded against it
    /// are accepted but never reported.
    pub const OVERFLOW: Self = Self(u32::MAX - 1);

    /// The largest scope capacity a profiler supports. Every valid index must stay below
    /// the raw value of [`OVERFLOW`][Self::OVERFLOW].
    pub(crate) const MAX_CAPACITY: usize = (u32::MAX - 1) as usize;

    /// Whether this is the degenerate overflow scope.
    #[must_use]
    pub fn is_overflow(self) -> bool {
        self == Self::OVERFLOW
    }

    #[must_use]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub(crate) const fn as_raw(self) -> u32 {
        self.0
    }
}

/// Aggregated timing of one instrumentation call site during the current frame.
///
/// Two call sites that use the same name still get two independent scopes: identity is
/// per call site, not per name.
///
/// The elapsed time and invocation count are reset at the start of every frame.
#[derive(Debug)]
pub struct Scope {
    // Set exactly once, by the thread that allocated the scope.
    name: OnceLock<&'static str>,
    index: u32,

    // Address of the `ScopeSite` that registered the scope, or `NO_SITE`.
    site: AtomicUsize,

    elapsed: AtomicU64,
    count: AtomicU64,
}

impl Scope {
    fn new(index: u32) -> Self {
        Self {
            name: OnceLock::new(),
            index,
            site: AtomicUsize::new(NO_SITE),
            elapsed: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// The display name given when the scope was allocated.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name.get().copied().unwrap_or_default()
    }

    /// The stable index of the scope in the registry, in allocation order.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The handle that refers to this scope.
    #[must_use]
    pub fn id(&self) -> ScopeId {
        ScopeId(self.index)
    }

    /// Total ticks spent in this scope during the current frame, summed over all invocations.
    #[must_use]
    pub fn elapsed(&self) -> Ticks {
        self.elapsed.load(ACCUMULATOR_ORDERING)
    }

    /// Number of completed invocations of this scope during the current frame.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(ACCUMULATOR_ORDERING)
    }

    /// Folds one completed invocation into the accumulators.
    #[inline]
    pub(crate) fn record(&self, elapsed: Ticks) {
        self.elapsed.fetch_add(elapsed, ACCUMULATOR_ORDERING);
        self.count.fetch_add(1, ACCUMULATOR_ORDERING);
    }

    fn reset(&self) {
        self.elapsed.store(0, ACCUMULATOR_ORDERING);
        self.count.store(0, ACCUMULATOR_ORDERING);
    }

    fn is_published(&self) -> bool {
        self.name.get().is_some()
    }
}

/// Fixed-capacity table of scopes. Slots are handed out in order and never reclaimed.
#[derive(Debug)]
pub(crate) struct ScopeRegistry {
    scopes: Box<[Scope]>,

    // Number of slots handed out. Never exceeds `scopes.len()`.
    allocated: AtomicUsize,

    overflow: Scope,
    out_of_scopes: AtomicBool,

    // Serializes call-site registration so that each site gets at most one scope.
    site_lock: Mutex<()>,
}

impl ScopeRegistry {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.min(ScopeId::MAX_CAPACITY);

        #[expect(
            clippy::cast_possible_truncation,
            reason = "capacity is clamped to the u32 range above"
        )]
        let scopes = (0..capacity)
            .map(|index| Scope::new(index as u32))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let overflow = Scope {
            name: OnceLock::from(OVERFLOW_SCOPE_NAME),
            ..Scope::new(ScopeId::OVERFLOW.0)
        };

        Self {
            scopes,
            allocated: AtomicUsize::new(0),
            overflow,
            out_of_scopes: AtomicBool::new(false),
            site_lock: Mutex::new(()),
        }
    }

    /// Claims the next free slot for a new scope.
    ///
    /// If the registry is full, the exhaustion flag is raised and the overflow scope is returned.
    pub(crate) fn allocate(&self, name: &'static str) -> ScopeId {
        let capacity = self.scopes.len();

        let claimed = self
            .allocated
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |allocated| {
                (allocated < capacity).then(|| allocated.wrapping_add(1))
            });

        let Ok(index) = claimed else {
            if !self.out_of_scopes.swap(true, Ordering::Relaxed) {
                tracing::warn!(
                    capacity,
                    scope = name,
                    "scope registry is full; further scopes will not be reported"
                );
            }

            return ScopeId::OVERFLOW;
        };

        let Some(scope) = self.scopes.get(index) else {
            return ScopeId::OVERFLOW;
        };

        // Each slot is claimed by exactly one allocation, so the name is always unset here.
        if scope.name.set(name).is_err() {
            return ScopeId::OVERFLOW;
        }

        scope.id()
    }

    /// Returns the scope registered for the call site at address `site`, allocating it
    /// on first use.
    ///
    /// Repeated calls for the same site return the same scope, even if the site has been
    /// used with other profilers in between.
    #[cold]
    pub(crate) fn resolve_site(&self, site: usize, name: &'static str) -> ScopeId {
        let _guard = self.site_lock.lock().expect(ERR_POISONED_LOCK);

        if let Some(existing) = self
            .published()
            .find(|scope| scope.site.load(Ordering::Relaxed) == site)
        {
            return existing.id();
        }

        let id = self.allocate(name);

        if !id.is_overflow() {
            self.get(id).site.store(site, Ordering::Relaxed);
        }

        id
    }

    /// Resolves a handle. Unknown handles resolve to the overflow scope.
    #[inline]
    pub(crate) fn get(&self, id: ScopeId) -> &Scope {
        self.scopes.get(id.0 as usize).unwrap_or(&self.overflow)
    }

    /// Zeroes the per-frame accumulators of every scope, including the overflow scope.
    pub(crate) fn reset_accumulators(&self) {
        for scope in self.published() {
            scope.reset();
        }

        self.overflow.reset();
    }

    /// All scopes that have been allocated, in allocation order.
    pub(crate) fn published(&self) -> impl Iterator<Item = &Scope> {
        let allocated = self.allocated.load(Ordering::Relaxed);

        self.scopes
            .iter()
            .take(allocated)
            // A slot is claimed slightly before its name is set. Such a scope is not yet visible.
            .filter(|scope| scope.is_published())
    }

    pub(crate) fn is_out_of_scopes(&self) -> bool {
        self.out_of_scopes.load(Ordering::Relaxed)
    }

    pub(crate) fn capacity(&self) -> usize {
        self.scopes.len()
    }
}
