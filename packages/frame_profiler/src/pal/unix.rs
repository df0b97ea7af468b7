mod tick_source;

pub(crate) use tick_source::*;
