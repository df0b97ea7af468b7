use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::rolling_window::RollingWindow;
use crate::{ERR_POISONED_LOCK, Error, Result, Ticks};

/// Owns the begin/end protocol and the frame timing statistics.
///
/// The state is written only by `begin()`/`end()` on the frame driver thread but the
/// timing queries may be read from anywhere, hence the atomics.
#[derive(Debug)]
pub(crate) struct FrameController {
    in_frame: AtomicBool,

    // Number of the current (or most recently completed) frame. 0 before the first frame.
    frame_index: AtomicU64,
    frame_start: AtomicU64,

    last_frame: AtomicU64,
    max_frame: AtomicU64,

    window: Mutex<RollingWindow>,
}

impl FrameController {
    pub(crate) const fn new() -> Self {
        Self {
            in_frame: AtomicBool::new(false),
            frame_index: AtomicU64::new(0),
            frame_start: AtomicU64::new(0),
            last_frame: AtomicU64::new(0),
            max_frame: AtomicU64::new(0),
            window: Mutex::new(RollingWindow::new()),
        }
    }

    /// Idle -> in frame. Returns the number of the new frame.
    pub(crate) fn begin(&self, now: Ticks) -> Result<u64> {
        if self
            .in_frame
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            tracing::warn!("begin() called while a frame is already in progress; ignoring");
            return Err(Error::FrameAlreadyStarted);
        }

        self.frame_start.store(now, Ordering::Relaxed);

        Ok(self
            .frame_index
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1))
    }

    /// In frame -> idle. Returns the duration of the completed frame.
    pub(crate) fn end(&self, now: Ticks) -> Result<Ticks> {
        if self
            .in_frame
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            tracing::warn!("end() called without a matching begin(); ignoring");
            return Err(Error::NoFrameInProgress);
        }

        let duration = now.saturating_sub(self.frame_start.load(Ordering::Relaxed));

        let max = {
            let mut window = self.window.lock().expect(ERR_POISONED_LOCK);
            window.push(duration);
            window.max()
        };

        self.last_frame.store(duration, Ordering::Relaxed);
        self.max_frame.store(max, Ordering::Relaxed);

        Ok(duration)
    }

    pub(crate) fn is_in_frame(&self) -> bool {
        self.in_frame.load(Ordering::Relaxed)
    }

    pub(crate) fn frame_index(&self) -> u64 {
        self.frame_index.load(Ordering::Relaxed)
    }

    pub(crate) fn frame_start(&self) -> Ticks {
        self.frame_start.load(Ordering::Relaxed)
    }

    pub(crate) fn last_frame(&self) -> Ticks {
        self.last_frame.load(Ordering::Relaxed)
    }

    pub(crate) fn max_frame(&self) -> Ticks {
        self.max_frame.load(Ordering::Relaxed)
    }
}
