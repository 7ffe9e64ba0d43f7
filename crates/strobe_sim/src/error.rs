//! Kernel error types.

use thiserror::Error;

/// Errors produced by the simulation kernel.
///
/// A `Fatal` error is raised by testbench code through
/// [`ProcCtx::fatal`](crate::ProcCtx::fatal) and terminates the run with
/// [`StopReason::Fatal`](crate::StopReason::Fatal). Every other variant is a
/// configuration or progress error and surfaces directly from
/// [`Kernel::run`](crate::Kernel::run).
#[derive(Debug, Error)]
pub enum SimError {
    /// A process referenced a signal id that was never registered.
    #[error("unknown signal id {id}")]
    UnknownSignal {
        /// The raw signal id.
        id: u32,
    },
    /// A process tried to join a fork group that does not exist.
    #[error("unknown fork group id {id}")]
    UnknownGroup {
        /// The raw group id.
        id: u32,
    },
    /// Zero-time activity at one instant exceeded the configured cap,
    /// which almost always means a combinational feedback loop.
    #[error("delta cycle limit exceeded at {fs} fs (max {max_deltas} per instant)")]
    DeltaCycleLimit {
        /// Simulation time at which the cap was hit, in femtoseconds.
        fs: u64,
        /// The configured cap.
        max_deltas: u32,
    },
    /// The event queue drained while processes were still waiting on
    /// signal changes or fork groups that can no longer occur.
    #[error("deadlock at {fs} fs: {waiting} process(es) waiting with no pending events")]
    Deadlock {
        /// Simulation time at which the queue drained, in femtoseconds.
        fs: u64,
        /// Number of processes still suspended.
        waiting: usize,
    },
    /// A testbench process requested immediate termination.
    #[error("fatal at {fs} fs: {message}")]
    Fatal {
        /// Simulation time of the fatal report, in femtoseconds.
        fs: u64,
        /// The process-supplied message.
        message: String,
    },
    /// A log sink failed to flush.
    #[error("log flush failed: {0}")]
    LogIo(#[from] std::io::Error),
}
