use std::hash::BuildHasher;
use std::iter;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use foldhash::fast::FixedState;

use crate::{CounterValue, ERR_POISONED_LOCK, NameHash};

/// Fixed seed so that hashes are stable for the lifetime of the process,
/// allowing callers to compute them once and cache them.
const NAME_HASH_SEED: u64 = 0x5f3c_9a1e_d2b4_7c61;

/// Marks an unused slot in the lookup table. Occupied slots store the entry index plus one.
const EMPTY_SLOT: u32 = 0;

/// Hashes a counter name for use with the fast counter path.
///
/// Compute the hash once (for example at first use) and pass it to
/// [`Profiler::add_counter_hash()`][crate::Profiler::add_counter_hash] or
/// [`counter_hash!`][crate::counter_hash] to skip hashing on every increment.
///
/// # Example
///
/// ```
/// use frame_profiler::{Profiler, counter_hash};
///
/// let profiler = Profiler::new(16, 256, 8);
/// let draw_calls = counter_hash("draw_calls");
///
/// for _ in 0..10 {
///     profiler.add_counter_hash("draw_calls", draw_calls, 1);
/// }
///
/// assert_eq!(profiler.counter_value(draw_calls), Some(10));
/// ```
#[must_use]
pub fn counter_hash(name: &str) -> NameHash {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "intentional - counters are keyed by a 32-bit hash"
    )]
    let hash = FixedState::with_seed(NAME_HASH_SEED).hash_one(name) as NameHash;

    hash
}

/// A named numeric accumulator that persists across frames.
#[derive(Debug)]
pub struct Counter {
    // Set before the entry is published via the lookup table.
    name: OnceLock<&'static str>,
    name_hash: AtomicU32,

    value: AtomicU64,
}

impl Counter {
    fn new() -> Self {
        Self {
            name: OnceLock::new(),
            name_hash: AtomicU32::new(0),
            value: AtomicU64::new(0),
        }
    }

    /// The display name given when the counter was created.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name.get().copied().unwrap_or_default()
    }

    /// The hash the counter is keyed by.
    #[must_use]
    pub fn name_hash(&self) -> NameHash {
        self.name_hash.load(Ordering::Relaxed)
    }

    /// The accumulated value since the counter was created.
    #[must_use]
    pub fn value(&self) -> CounterValue {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    fn add(&self, amount: CounterValue) {
        // Wraps on overflow. Do not stray near the u64 limit.
        self.value.fetch_add(amount, Ordering::Relaxed);
    }
}

/// Fixed-capacity table of counters, keyed by name hash.
///
/// Lookups probe an open-addressing table without locking. Creating a counter takes a mutex,
/// so hot paths should make sure the counter exists before they start hammering it.
#[derive(Debug)]
pub(crate) struct CounterRegistry {
    // Entries in creation order. The first `len` of them are published.
    entries: Box<[Counter]>,
    len: AtomicUsize,

    // Power-of-two sized, at least twice the capacity so probes stay short and always terminate.
    lookup: Box<[AtomicU32]>,
    lookup_mask: usize,

    create_lock: Mutex<()>,
    out_of_counters: AtomicBool,
}

impl CounterRegistry {
    pub(crate) fn new(capacity: usize) -> Self {
        // Keep indexes representable in a lookup slot.
        let capacity = capacity.min(u32::MAX as usize / 2);

        let lookup_len = capacity.saturating_mul(2).max(1).next_power_of_two();

        Self {
            entries: iter::repeat_with(Counter::new)
                .take(capacity)
                .collect::<Vec<_>>()
                .into_boxed_slice(),
            len: AtomicUsize::new(0),
            lookup: iter::repeat_with(|| AtomicU32::new(EMPTY_SLOT))
                .take(lookup_len)
                .collect::<Vec<_>>()
                .into_boxed_slice(),
            lookup_mask: lookup_len.wrapping_sub(1),
            create_lock: Mutex::new(()),
            out_of_counters: AtomicBool::new(false),
        }
    }

    /// Adds `amount` to the counter, creating it under `name` if it does not exist yet.
    ///
    /// If the counter does not exist and the registry is full, the increment is dropped.
    #[inline]
    pub(crate) fn add(&self, name: &'static str, name_hash: NameHash, amount: CounterValue) {
        if let Some(counter) = self.find(name_hash) {
            counter.add(amount);
            return;
        }

        // A full registry never creates anything again, so do not bother taking the lock.
        if self.len.load(Ordering::Acquire) >= self.entries.len() {
            self.signal_exhausted(name);
            return;
        }

        if let Some(counter) = self.find_or_create(name, name_hash) {
            counter.add(amount);
        }
    }

    /// Finds a published counter without taking any lock.
    pub(crate) fn find(&self, name_hash: NameHash) -> Option<&Counter> {
        for slot in self.probe(name_hash) {
            match slot.load(Ordering::Acquire) {
                EMPTY_SLOT => return None,
                occupied => {
                    if let Some(counter) = self
                        .entry(occupied)
                        .filter(|counter| counter.name_hash() == name_hash)
                    {
                        return Some(counter);
                    }
                }
            }
        }

        None
    }

    #[cold]
    fn find_or_create(&self, name: &'static str, name_hash: NameHash) -> Option<&Counter> {
        let _guard = self.create_lock.lock().expect(ERR_POISONED_LOCK);

        // Somebody may have created it while we were waiting for the lock.
        let mut free_slot = None;

        for slot in self.probe(name_hash) {
            match slot.load(Ordering::Acquire) {
                EMPTY_SLOT => {
                    free_slot = Some(slot);
                    break;
                }
                occupied => {
                    if let Some(counter) = self
                        .entry(occupied)
                        .filter(|counter| counter.name_hash() == name_hash)
                    {
                        return Some(counter);
                    }
                }
            }
        }

        let index = self.len.load(Ordering::Relaxed);

        let (Some(free_slot), Some(counter)) = (free_slot, self.entries.get(index)) else {
            self.signal_exhausted(name);
            return None;
        };

        // Entries past `len` are never named, so this only fails if the table is corrupt.
        counter.name.set(name).ok()?;
        counter.name_hash.store(name_hash, Ordering::Relaxed);

        self.len.store(index.wrapping_add(1), Ordering::Release);

        #[expect(
            clippy::cast_possible_truncation,
            reason = "capacity is limited to half the u32 range in the constructor"
        )]
        let encoded = index.wrapping_add(1) as u32;

        // Publishes the fully initialized entry to lock-free readers.
        free_slot.store(encoded, Ordering::Release);

        Some(counter)
    }

    /// Raises the sticky exhaustion flag, logging the first time only.
    fn signal_exhausted(&self, name: &'static str) {
        if !self.out_of_counters.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                capacity = self.entries.len(),
                counter = name,
                "counter registry is full; increments of new counters will be dropped"
            );
        }
    }

    /// The lookup slots to visit for a hash, in probe order. Visits every slot at most once.
    fn probe(&self, name_hash: NameHash) -> impl Iterator<Item = &AtomicU32> {
        let start = (name_hash as usize) & self.lookup_mask;

        self.lookup
            .iter()
            .skip(start)
            .chain(self.lookup.iter().take(start))
    }

    /// Decodes a lookup slot. `None` for values that do not reference an entry.
    fn entry(&self, encoded: u32) -> Option<&Counter> {
        self.entries.get((encoded as usize).wrapping_sub(1))
    }

    /// All counters in creation order.
    pub(crate) fn published(&self) -> impl Iterator<Item = &Counter> {
        let len = self.len.load(Ordering::Acquire);

        self.entries.iter().take(len)
    }

    pub(crate) fn is_out_of_counters(&self) -> bool {
        self.out_of_counters.load(Ordering::Relaxed)
    }

    pub(crate) fn capacity(&self) -> usize {
        self.entries.len()
    }
}
