use crate::{ROLLING_WINDOW_FRAMES, Ticks};

/// The durations of the most recent completed frames, oldest overwritten first.
#[derive(Debug)]
pub(crate) struct RollingWindow {
    durations: [Ticks; ROLLING_WINDOW_FRAMES],

    // Number of valid entries, saturating at the window size.
    len: usize,

    // Where the next duration goes.
    next: usize,
}

impl RollingWindow {
    pub(crate) const fn new() -> Self {
        Self {
            durations: [0; ROLLING_WINDOW_FRAMES],
            len: 0,
            next: 0,
        }
    }

    pub(crate) fn push(&mut self, duration: Ticks) {
        if let Some(slot) = self.durations.get_mut(self.next) {
            *slot = duration;
        }

        self.next = self.next.wrapping_add(1) % ROLLING_WINDOW_FRAMES;
        self.len = self.len.saturating_add(1).min(ROLLING_WINDOW_FRAMES);
    }

    /// The largest duration in the window, or 0 if no frame has completed yet.
    pub(crate) fn max(&self) -> Ticks {
        self.durations
            .iter()
            .take(self.len)
            .copied()
            .max()
            .unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}
