use thiserror::Error;

/// Errors reported by the profiler lifecycle and frame protocol.
///
/// Instrumentation itself (timed regions, counters) never fails; running out of capacity is
/// reported through the `is_out_of_*` queries instead.
#[derive(Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A process-wide profiler is already installed. Finalize it first.
    #[error("a process-wide profiler is already initialized")]
    AlreadyInitialized,

    /// No process-wide profiler is installed.
    #[error("no process-wide profiler is initialized")]
    NotInitialized,

    /// `begin()` was called while a frame was already in progress.
    #[error("cannot begin a frame while another frame is in progress")]
    FrameAlreadyStarted,

    /// `end()` was called without a matching `begin()`.
    #[error("cannot end a frame because no frame is in progress")]
    NoFrameInProgress,
}

/// A specialized `Result` type for profiler operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
