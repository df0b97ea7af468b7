use std::fmt::{self, Debug};
#[cfg(test)]
use std::sync::Arc;

use crate::Ticks;
#[cfg(test)]
use crate::pal::MockTickSource;
use crate::pal::{TickSource, TickSourceImpl};

/// Dispatches to the tick source of the build target, or to a mock in tests.
#[derive(Clone)]
pub(crate) enum TickSourceFacade {
    Real(TickSourceImpl),

    #[cfg(test)]
    Mock(Arc<MockTickSource>),
}

impl TickSourceFacade {
    pub(crate) fn real() -> Self {
        Self::Real(TickSourceImpl::new())
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockTickSource) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

impl TickSource for TickSourceFacade {
    #[inline]
    fn now_ticks(&self) -> Ticks {
        match self {
            Self::Real(ts) => ts.now_ticks(),
            #[cfg(test)]
            Self::Mock(ts) => ts.now_ticks(),
        }
    }

    fn ticks_per_second(&self) -> u64 {
        match self {
            Self::Real(ts) => ts.ticks_per_second(),
            #[cfg(test)]
            Self::Mock(ts) => ts.ticks_per_second(),
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl Debug for TickSourceFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(ts) => ts.fmt(f),
            #[cfg(test)]
            Self::Mock(ts) => ts.fmt(f),
        }
    }
}
