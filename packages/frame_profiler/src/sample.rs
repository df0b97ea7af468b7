use std::cell::UnsafeCell;
use std::iter;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use crate::{ScopeId, Ticks};

/// One timed invocation of a scope within the current frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Sample {
    // Frame the sample was allocated in. 0 means the slot has never been written.
    frame: u64,

    name: &'static str,
    scope: ScopeId,
    start: Ticks,
    elapsed: Ticks,
}

impl Sample {
    const EMPTY: Self = Self {
        frame: 0,
        name: "",
        scope: ScopeId::OVERFLOW,
        start: 0,
        elapsed: 0,
    };

    /// The per-invocation label given when the timed region was entered.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The scope the invocation was folded into.
    ///
    /// Resolve it via [`Profiler::scope()`][crate::Profiler::scope].
    #[must_use]
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// When the invocation started, in ticks since the start of the frame.
    ///
    /// Regions entered before the frame began report 0.
    #[must_use]
    pub fn start(&self) -> Ticks {
        self.start
    }

    /// How long the invocation took, in ticks.
    #[must_use]
    pub fn elapsed(&self) -> Ticks {
        self.elapsed
    }
}

/// Reservation of a slot in the sample buffer, valid for the frame it was made in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SampleId {
    // `None` is the shared overflow slot.
    index: Option<usize>,
    frame: u64,
}

impl SampleId {
    /// Whether the buffer was full and this reservation points at the discarded overflow slot.
    #[must_use]
    pub fn is_overflow(&self) -> bool {
        self.index.is_none()
    }
}

/// A slot with a non-blocking write guard.
///
/// Only the allocating thread writes a regular slot, so the guard is uncontended in the
/// normal case. It exists for the overflow slot (shared by every caller past capacity) and
/// for regions that span a frame boundary, whose slot may have been handed out again.
/// Whoever finds the slot busy gives up instead of waiting.
#[derive(Debug)]
struct SampleSlot {
    busy: AtomicBool,
    sample: UnsafeCell<Sample>,
}

// SAFETY: The `UnsafeCell` is only accessed while `busy` is held, which grants exclusive access.
unsafe impl Sync for SampleSlot {}

impl SampleSlot {
    fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
            sample: UnsafeCell::new(Sample::EMPTY),
        }
    }

    fn try_acquire(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    /// Stores the sample unless someone else is using the slot, in which case it is dropped.
    ///
    /// A sample from an older frame never replaces one from a newer frame.
    #[inline]
    fn write(&self, sample: Sample) {
        if !self.try_acquire() {
            return;
        }

        // SAFETY: We hold `busy`, so nobody else is accessing the cell.
        let current = unsafe { &mut *self.sample.get() };

        if current.frame <= sample.frame {
            *current = sample;
        }

        self.release();
    }

    /// Copies out the sample, or `None` if a writer is active right now.
    fn read(&self) -> Option<Sample> {
        if !self.try_acquire() {
            return None;
        }

        // SAFETY: We hold `busy`, so nobody else is accessing the cell.
        let sample = unsafe { *self.sample.get() };

        self.release();

        Some(sample)
    }
}

/// Fixed-capacity buffer of the samples recorded during the current frame.
///
/// Slots are reserved with a single atomic increment of a cursor. Starting a new frame
/// resets the cursor, which logically empties the buffer without touching the slots: every
/// sample is tagged with the frame it was reserved in and older samples are never reported.
#[derive(Debug)]
pub(crate) struct SampleBuffer {
    slots: Box<[SampleSlot]>,
    cursor: AtomicUsize,

    // The current frame number. Starts at 0, meaning "before the first frame".
    frame: AtomicU64,

    overflow: SampleSlot,
    out_of_samples: AtomicBool,
}

impl SampleBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: iter::repeat_with(SampleSlot::new)
                .take(capacity)
                .collect::<Vec<_>>()
                .into_boxed_slice(),
            cursor: AtomicUsize::new(0),
            frame: AtomicU64::new(0),
            overflow: SampleSlot::new(),
            out_of_samples: AtomicBool::new(false),
        }
    }

    /// Reserves the next slot for the calling thread.
    ///
    /// Past capacity, the exhaustion flag is raised and the shared overflow slot is returned.
    #[inline]
    pub(crate) fn allocate(&self) -> SampleId {
        let frame = self.frame.load(Ordering::Relaxed);
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);

        if index < self.slots.len() {
            return SampleId {
                index: Some(index),
                frame,
            };
        }

        // The cursor only moves back at frame start, so reservations past capacity cannot
        // realistically wrap it around before then.
        if !self.out_of_samples.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                capacity = self.slots.len(),
                "sample buffer is full; further samples this frame will be discarded"
            );
        }

        SampleId { index: None, frame }
    }

    /// Fills in a reserved slot.
    ///
    /// Reservations from an earlier frame are dropped without touching the slot, which may
    /// already belong to a region of the current frame.
    #[inline]
    pub(crate) fn write(
        &self,
        id: SampleId,
        name: &'static str,
        scope: ScopeId,
        start: Ticks,
        elapsed: Ticks,
    ) {
        if id.frame != self.frame.load(Ordering::Relaxed) {
            return;
        }

        let slot = id
            .index
            .and_then(|index| self.slots.get(index))
            .unwrap_or(&self.overflow);

        slot.write(Sample {
            frame: id.frame,
            name,
            scope,
            start,
            elapsed,
        });
    }

    /// Starts a new frame, logically discarding every sample of the previous one.
    pub(crate) fn reset(&self, frame: u64) {
        self.frame.store(frame, Ordering::Relaxed);
        self.cursor.store(0, Ordering::Relaxed);
    }

    /// The samples of the current frame in reservation order.
    ///
    /// Slots that were reserved but whose region has not yet exited are skipped.
    pub(crate) fn current(&self) -> impl Iterator<Item = Sample> {
        let frame = self.frame.load(Ordering::Relaxed);
        let reserved = self.cursor.load(Ordering::Relaxed);

        self.slots
            .iter()
            .take(reserved)
            .filter_map(SampleSlot::read)
            .filter(move |sample| sample.frame == frame && frame != 0)
    }

    pub(crate) fn is_out_of_samples(&self) -> bool {
        self.out_of_samples.load(Ordering::Relaxed)
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}
